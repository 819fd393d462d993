pub mod locator;
pub mod request;
pub mod strategy;
