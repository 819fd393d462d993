use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::normalize::normalize_text;

/// Opaque reference to one element of the live page, issued by the driver.
///
/// Handles are only meaningful to the driver that produced them and only
/// for the page generation they were captured in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ElementHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shallow summary of an element nested inside a component: a page number,
/// a tree node, a selected tag, an uploaded file entry, a table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedItem {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Cell texts of a table row, in column order.
    #[serde(default)]
    pub cells: Vec<String>,
}

impl NestedItem {
    pub fn has_class(&self, token: &str) -> bool {
        self.classes.iter().any(|c| c == token)
    }

    pub fn has_class_prefix(&self, prefix: &str) -> bool {
        self.classes.iter().any(|c| c.starts_with(prefix))
    }

    /// Visible text, falling back to the title attribute.
    pub fn display_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.title.as_deref())
    }
}

/// Raw observable attributes of one element, as reported by one traversal.
///
/// ARIA attributes are keyed without their `aria-` prefix (`checked`,
/// `disabled`, `busy`, ...). `properties` holds values read through the
/// driver's script escape hatch (for example an input's live `value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    pub handle: ElementHandle,
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "ariaLabel")]
    pub aria_label: Option<String>,
    /// Text of an associated `<label>` or form-item label.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Name of the enclosing group or container: a radio or checkbox
    /// group, a fieldset legend, a form section title.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub aria: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub attached: bool,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub items: Vec<NestedItem>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl RawElement {
    /// A minimal visible element, mostly useful for drivers and tests that
    /// assemble elements by hand.
    pub fn new(handle: impl Into<String>, tag: impl Into<String>) -> Self {
        RawElement {
            handle: ElementHandle::new(handle),
            tag: tag.into(),
            role: None,
            classes: Vec::new(),
            marker: None,
            text: None,
            aria_label: None,
            label: None,
            placeholder: None,
            group: None,
            aria: BTreeMap::new(),
            attributes: BTreeMap::new(),
            visible: true,
            attached: true,
            width: 10.0,
            height: 10.0,
            items: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes.iter().any(|c| c == token)
    }

    pub fn has_class_prefix(&self, prefix: &str) -> bool {
        self.classes.iter().any(|c| c.starts_with(prefix))
    }

    pub fn has_class_suffix(&self, suffix: &str) -> bool {
        self.classes.iter().any(|c| c.ends_with(suffix))
    }

    pub fn aria(&self, name: &str) -> Option<&str> {
        self.aria.get(name).map(String::as_str)
    }

    /// `Some(true)` / `Some(false)` for an ARIA boolean, `None` when absent
    /// or not a boolean token.
    pub fn aria_flag(&self, name: &str) -> Option<bool> {
        match self.aria(name)?.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn input_type(&self) -> Option<&str> {
        self.attribute("type")
    }

    /// Live property read through a script probe, rendered as text.
    pub fn property_text(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn property_flag(&self, name: &str) -> Option<bool> {
        self.properties.get(name).and_then(Value::as_bool)
    }

    /// Attached, displayed and of non-zero size.
    pub fn is_rendered(&self) -> bool {
        self.attached && self.visible && self.width > 0.0 && self.height > 0.0
    }

    pub fn items_with_class<'a>(&'a self, token: &'a str) -> impl Iterator<Item = &'a NestedItem> + 'a {
        self.items.iter().filter(move |i| i.has_class(token))
    }
}

/// One element found during discovery, with its classification and its
/// position in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub raw: RawElement,
    /// 0-based document-order index within the traversal that produced it.
    pub order: usize,
    /// Component kind assigned by the registry, if any descriptor claimed it.
    pub kind: Option<String>,
    /// Normalized label text (whitespace-collapsed, trimmed); empty if none.
    pub label: String,
}

impl Candidate {
    pub fn handle(&self) -> &ElementHandle {
        &self.raw.handle
    }

    pub fn marker(&self) -> Option<&str> {
        self.raw.marker.as_deref()
    }

    pub fn is_rendered(&self) -> bool {
        self.raw.is_rendered()
    }

    /// True if the element sits in the group or container named `scope`.
    /// Names compare normalized and ignoring ASCII case.
    pub fn in_group(&self, scope: &str) -> bool {
        let wanted = normalize_text(scope);
        self.raw
            .group
            .as_deref()
            .map(normalize_text)
            .is_some_and(|g| !wanted.is_empty() && g.eq_ignore_ascii_case(&wanted))
    }

    /// True if the candidate belongs to `kind`; `any` and the empty string
    /// match every classified element.
    pub fn is_kind(&self, kind: &str) -> bool {
        match self.kind.as_deref() {
            Some(k) => is_wildcard_kind(kind) || k == kind,
            None => false,
        }
    }
}

pub fn is_wildcard_kind(kind: &str) -> bool {
    kind.is_empty() || kind == "any"
}
