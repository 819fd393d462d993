use serde_json::Value;

use crate::error::DriverError;
use crate::page::element::{ElementHandle, RawElement};

/// Blocking primitives the engine consumes from a browser-automation driver.
///
/// Every call returns only once the driver has finished with it. Handles are
/// issued by `snapshot` and are valid until the page re-renders the element;
/// calls on an outdated handle fail with `DriverError::StaleElement`.
pub trait Driver {
    /// Every element of the rendered page in document order, hidden and
    /// disabled ones included.
    fn snapshot(&mut self) -> Result<Vec<RawElement>, DriverError>;

    /// Re-read one element. `None` when it is no longer attached.
    fn refresh(&mut self, handle: &ElementHandle) -> Result<Option<RawElement>, DriverError>;

    fn click(&mut self, handle: &ElementHandle) -> Result<(), DriverError>;

    /// Replace the element's value (text fields, file inputs).
    fn set_value(&mut self, handle: &ElementHandle, value: &str) -> Result<(), DriverError>;

    fn drag(&mut self, from: &ElementHandle, to: &ElementHandle) -> Result<(), DriverError>;

    /// Run a script in the page. With a handle the element is passed as
    /// `arguments[0]`.
    fn execute_script(
        &mut self,
        script: &str,
        handle: Option<&ElementHandle>,
    ) -> Result<Value, DriverError>;

    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;
}

impl<D: Driver + ?Sized> Driver for &mut D {
    fn snapshot(&mut self) -> Result<Vec<RawElement>, DriverError> {
        (**self).snapshot()
    }

    fn refresh(&mut self, handle: &ElementHandle) -> Result<Option<RawElement>, DriverError> {
        (**self).refresh(handle)
    }

    fn click(&mut self, handle: &ElementHandle) -> Result<(), DriverError> {
        (**self).click(handle)
    }

    fn set_value(&mut self, handle: &ElementHandle, value: &str) -> Result<(), DriverError> {
        (**self).set_value(handle, value)
    }

    fn drag(&mut self, from: &ElementHandle, to: &ElementHandle) -> Result<(), DriverError> {
        (**self).drag(from, to)
    }

    fn execute_script(
        &mut self,
        script: &str,
        handle: Option<&ElementHandle>,
    ) -> Result<Value, DriverError> {
        (**self).execute_script(script, handle)
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        (**self).navigate(url)
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        (**self).current_url()
    }
}
