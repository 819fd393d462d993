use serde::{Deserialize, Serialize};

use crate::page::element::RawElement;

/// Decides whether a raw element is an instance of a kind.
pub type Classifier = fn(&RawElement) -> bool;

/// Extracts the kind-specific part of a state descriptor.
pub type StateExtractor = fn(&RawElement) -> KindState;

/// How a kind reacts to the binary state actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleModel {
    /// No checked state.
    None,
    /// On/off control: check, uncheck, toggle, turn on, turn off.
    Binary,
    /// Can be selected but not deselected directly (radio).
    SelectOnly,
}

/// Interactions a kind supports beyond a plain click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub toggle: ToggleModel,
    pub text_entry: bool,
    /// Opens a popup of options or tree nodes that can be picked by label.
    pub selectable: bool,
    pub paged: bool,
    pub upload: bool,
}

impl Interaction {
    pub const CLICK_ONLY: Interaction = Interaction {
        toggle: ToggleModel::None,
        text_entry: false,
        selectable: false,
        paged: false,
        upload: false,
    };
}

/// Capability descriptor of one component kind.
///
/// Adding a kind to the engine means registering one of these; the
/// locator, identifier and handler dispatch on it by name.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub name: &'static str,
    pub classify: Classifier,
    pub extract: StateExtractor,
    /// Attribute holding the component's variant; when absent on an element
    /// the extractor's class-derived variant is used.
    pub variant_attribute: &'static str,
    /// Script run through the driver to read live state that attributes do
    /// not reflect. It receives the element as `arguments[0]` and returns
    /// an object whose keys are merged into `RawElement::properties`.
    pub live_probe: Option<&'static str>,
    pub interaction: Interaction,
    /// Kind of the popup entries picked by `select` or `go_to_page`.
    pub child_kind: Option<&'static str>,
}

/// Kind-specific state. A field is `None` when the kind does not model it,
/// which callers must not read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indeterminate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<u32>,
    /// Column headers, uploaded file names, or similar listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
    /// Outline of a button: `default`, `round` or `circle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_enabled: Option<bool>,
    /// Table with no data rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,
    /// Validation status of a field: `error`, `warning` or `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Nesting depth of a menu entry, 1 at the top.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}
