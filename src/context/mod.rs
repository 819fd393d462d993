pub mod element_context;
