pub mod element;
pub mod marker;
pub mod normalize;
pub mod pattern_index;
