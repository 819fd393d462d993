pub mod descriptors;
pub mod identifier;
pub mod kind;
pub mod registry;
pub mod table;
