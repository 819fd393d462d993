//! Locator-less resolution and interaction engine for rich web components.
//!
//! Callers name an element the way a person would (a label, a test-marker
//! value, a variant or a position) and the engine finds the one intended
//! element, waits until it can be used, acts on it and checks the result.

pub mod action;
pub mod browser;
pub mod cli;
pub mod component;
pub mod context;
pub mod error;
pub mod locate;
pub mod page;
pub mod report;
pub mod scenario;
pub mod trace;

pub use action::action_model::{ActionKind, ActionResult};
pub use action::config::{ActOptions, EngineConfig};
pub use action::handler::Engine;
pub use browser::driver::Driver;
pub use component::identifier::StateDescriptor;
pub use component::registry::KindRegistry;
pub use context::element_context::ElementContext;
pub use error::{DriverError, EngineError};
pub use locate::request::{IdentificationRequest, IdentifierType};
