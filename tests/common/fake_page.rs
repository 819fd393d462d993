use std::collections::{HashMap, VecDeque};

use locatorless::browser::driver::Driver;
use locatorless::error::DriverError;
use locatorless::page::element::{ElementHandle, NestedItem, RawElement};
use serde_json::Value;

/// A mutating call received by the fake driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Click(String),
    SetValue(String, String),
    Drag(String, String),
    Navigate(String),
}

/// Scripted failure returned by the next mutating call on a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Stale,
    Intercepted,
    Timeout,
    Permanent,
}

impl Failure {
    fn into_error(self, handle: &str) -> DriverError {
        match self {
            Failure::Stale => DriverError::StaleElement(handle.to_string()),
            Failure::Intercepted => DriverError::Intercepted(format!("overlay covers {handle}")),
            Failure::Timeout => DriverError::Timeout(handle.to_string()),
            Failure::Permanent => DriverError::Protocol {
                command: "click".into(),
                message: format!("{handle} cannot be clicked"),
            },
        }
    }
}

/// In-memory page that behaves like a small Ant Design screen.
///
/// Clicks flip ARIA `checked`, open popups, pick options and turn pages.
/// `set_value` writes the live `value` property or adds an upload entry.
pub struct FakePage {
    pub elements: Vec<RawElement>,
    pub calls: Vec<Call>,
    pub snapshots: usize,
    pub refreshes: usize,
    pub url: String,
    failures: HashMap<String, VecDeque<Failure>>,
    popups: HashMap<String, Vec<RawElement>>,
    links: HashMap<String, (String, Vec<RawElement>)>,
    pages: HashMap<String, Vec<RawElement>>,
    inert: Vec<String>,
    busy: HashMap<String, usize>,
    unreadable: Vec<String>,
    failing_snapshots: usize,
}

impl FakePage {
    pub fn new(elements: Vec<RawElement>) -> Self {
        FakePage {
            elements,
            calls: Vec::new(),
            snapshots: 0,
            refreshes: 0,
            url: "https://app.test/".to_string(),
            failures: HashMap::new(),
            popups: HashMap::new(),
            links: HashMap::new(),
            pages: HashMap::new(),
            inert: Vec::new(),
            busy: HashMap::new(),
            unreadable: Vec::new(),
            failing_snapshots: 0,
        }
    }

    /// The next mutating calls on `handle` fail in this order.
    pub fn fail_next(mut self, handle: &str, failures: &[Failure]) -> Self {
        self.failures
            .entry(handle.to_string())
            .or_default()
            .extend(failures.iter().copied());
        self
    }

    /// Clicking `container` renders `options` at the end of the page.
    pub fn with_popup(mut self, container: &str, options: Vec<RawElement>) -> Self {
        self.popups.insert(container.to_string(), options);
        self
    }

    /// Clicking `handle` loads `page` at `url`.
    pub fn with_link(mut self, handle: &str, url: &str, page: Vec<RawElement>) -> Self {
        self.links.insert(handle.to_string(), (url.to_string(), page));
        self
    }

    /// Navigating to `url` loads `page`.
    pub fn with_page(mut self, url: &str, page: Vec<RawElement>) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Clicks on `handle` are accepted but change nothing.
    pub fn inert(mut self, handle: &str) -> Self {
        self.inert.push(handle.to_string());
        self
    }

    /// `handle` stays loading for this many refreshes.
    pub fn busy_for(mut self, handle: &str, refreshes: usize) -> Self {
        self.busy.insert(handle.to_string(), refreshes);
        self
    }

    /// Every refresh of `handle` fails with a protocol error.
    pub fn unreadable(mut self, handle: &str) -> Self {
        self.unreadable.push(handle.to_string());
        self
    }

    pub fn failing_snapshots(mut self, count: usize) -> Self {
        self.failing_snapshots = count;
        self
    }

    pub fn clicks(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Click(_))).count()
    }

    pub fn clicks_on(&self, handle: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Click(h) if h == handle))
            .count()
    }

    pub fn element(&self, handle: &str) -> Option<&RawElement> {
        self.elements.iter().find(|e| e.handle.as_str() == handle)
    }

    pub fn element_mut(&mut self, handle: &str) -> Option<&mut RawElement> {
        self.elements.iter_mut().find(|e| e.handle.as_str() == handle)
    }

    pub fn remove(&mut self, handle: &str) {
        self.elements.retain(|e| e.handle.as_str() != handle);
    }

    fn position(&self, handle: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.handle.as_str() == handle)
    }

    fn take_failure(&mut self, handle: &str) -> Result<(), DriverError> {
        match self.failures.get_mut(handle).and_then(VecDeque::pop_front) {
            Some(failure) => Err(failure.into_error(handle)),
            None => Ok(()),
        }
    }

    fn open_popup(&mut self, pos: usize, options: Vec<RawElement>) {
        let container = &mut self.elements[pos];
        container.classes.push("ant-select-open".to_string());
        container.aria.insert("expanded".into(), "true".into());
        for option in options {
            if self.position(option.handle.as_str()).is_none() {
                self.elements.push(option);
            }
        }
    }

    fn pick_option(&mut self, container: &str, pos: usize) {
        let text = self.elements[pos].text.clone();
        let option_handles: Vec<String> = self
            .popups
            .get(container)
            .map(|opts| opts.iter().map(|o| o.handle.0.clone()).collect())
            .unwrap_or_default();

        let chosen = NestedItem {
            classes: vec!["ant-select-selection-item".into()],
            text,
            ..NestedItem::default()
        };

        // Multiple-choice selects add a tag and stay open.
        if let Some(el) = self.element_mut(container) {
            if el.has_class("ant-select-multiple") {
                if !el.items.contains(&chosen) {
                    el.items.push(chosen);
                }
                return;
            }
            el.items = vec![chosen];
            el.classes.retain(|c| c != "ant-select-open");
            el.aria.insert("expanded".into(), "false".into());
        }
        self.elements
            .retain(|e| !option_handles.contains(&e.handle.0));
    }

    fn turn_page(&mut self, pos: usize) {
        let page = self.elements[pos].text.clone();
        for el in &mut self.elements {
            if el.has_class("ant-pagination-item") {
                set_class(&mut el.classes, "ant-pagination-item-active", el.text == page);
            }
            for item in &mut el.items {
                if item.has_class("ant-pagination-item") {
                    set_class(&mut item.classes, "ant-pagination-item-active", item.text == page);
                }
            }
        }
    }
}

fn set_class(classes: &mut Vec<String>, token: &str, on: bool) {
    classes.retain(|c| c != token);
    if on {
        classes.push(token.to_string());
    }
}

fn flip_checked(el: &mut RawElement) {
    let radio = el.role.as_deref() == Some("radio") || el.has_class("ant-radio-wrapper");
    let now = if radio {
        true
    } else {
        el.aria_flag("checked") != Some(true)
    };
    el.aria.insert("checked".into(), now.to_string());
    for token in ["ant-switch-checked", "ant-checkbox-wrapper-checked", "ant-radio-wrapper-checked"] {
        if el.has_class(token.trim_end_matches("-checked")) {
            set_class(&mut el.classes, token, now);
        }
    }
}

fn clear_loading(el: &mut RawElement) {
    el.classes.retain(|c| !c.ends_with("-loading") && c != "loading");
    el.aria.remove("busy");
}

impl Driver for FakePage {
    fn snapshot(&mut self) -> Result<Vec<RawElement>, DriverError> {
        self.snapshots += 1;
        if self.failing_snapshots > 0 {
            self.failing_snapshots -= 1;
            return Err(DriverError::Timeout("snapshot".into()));
        }
        Ok(self.elements.clone())
    }

    fn refresh(&mut self, handle: &ElementHandle) -> Result<Option<RawElement>, DriverError> {
        self.refreshes += 1;
        if self.unreadable.iter().any(|h| h == handle.as_str()) {
            return Err(DriverError::Protocol {
                command: "refresh".into(),
                message: format!("{handle} cannot be read"),
            });
        }
        let Some(pos) = self.position(handle.as_str()) else {
            return Ok(None);
        };

        match self.busy.get(handle.as_str()).copied() {
            Some(0) => {
                self.busy.remove(handle.as_str());
                clear_loading(&mut self.elements[pos]);
            }
            Some(left) => {
                self.busy.insert(handle.as_str().to_string(), left - 1);
            }
            None => {}
        }

        let el = &self.elements[pos];
        Ok(el.attached.then(|| el.clone()))
    }

    fn click(&mut self, handle: &ElementHandle) -> Result<(), DriverError> {
        let id = handle.as_str().to_string();
        self.calls.push(Call::Click(id.clone()));
        self.take_failure(&id)?;

        let Some(pos) = self.position(&id) else {
            return Err(DriverError::StaleElement(id));
        };
        if self.inert.contains(&id) {
            return Ok(());
        }
        if let Some((url, page)) = self.links.get(&id).cloned() {
            self.url = url;
            self.elements = page;
            return Ok(());
        }
        if let Some(options) = self.popups.get(&id).cloned() {
            self.open_popup(pos, options);
            return Ok(());
        }
        let owner = self
            .popups
            .iter()
            .find(|(_, opts)| opts.iter().any(|o| o.handle.as_str() == id))
            .map(|(container, _)| container.clone());
        if let Some(container) = owner {
            self.pick_option(&container, pos);
            return Ok(());
        }
        if self.elements[pos].has_class("ant-pagination-item") {
            self.turn_page(pos);
            return Ok(());
        }

        flip_checked(&mut self.elements[pos]);
        Ok(())
    }

    fn set_value(&mut self, handle: &ElementHandle, value: &str) -> Result<(), DriverError> {
        let id = handle.as_str().to_string();
        self.calls.push(Call::SetValue(id.clone(), value.to_string()));
        self.take_failure(&id)?;

        let Some(el) = self.element_mut(&id) else {
            return Err(DriverError::StaleElement(id));
        };
        if el.has_class("ant-upload-wrapper") {
            let name = value.rsplit('/').next().unwrap_or(value).to_string();
            el.items.push(NestedItem {
                classes: vec!["ant-upload-list-item".into()],
                text: Some(name),
                ..NestedItem::default()
            });
        } else {
            el.properties
                .insert("value".into(), Value::String(value.to_string()));
        }
        Ok(())
    }

    fn drag(&mut self, from: &ElementHandle, to: &ElementHandle) -> Result<(), DriverError> {
        self.calls
            .push(Call::Drag(from.as_str().to_string(), to.as_str().to_string()));
        self.take_failure(from.as_str())
    }

    fn execute_script(
        &mut self,
        _script: &str,
        handle: Option<&ElementHandle>,
    ) -> Result<Value, DriverError> {
        let properties = handle
            .and_then(|h| self.element(h.as_str()))
            .map(|el| el.properties.clone())
            .unwrap_or_default();
        Ok(Value::Object(properties.into_iter().collect()))
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.calls.push(Call::Navigate(url.to_string()));
        self.url = url.to_string();
        if let Some(page) = self.pages.get(url) {
            self.elements = page.clone();
        }
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }
}
