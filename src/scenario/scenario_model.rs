use serde::{Deserialize, Serialize};

use crate::action::action_model::ActionKind;
use crate::component::identifier::StateDescriptor;
use crate::locate::request::{IdentificationRequest, IdentifierType};
use crate::locate::strategy::Strategy;

/// A scenario: an ordered list of already-formed step tuples, run against
/// one page with a fresh Element Context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,

    /// Navigated to before the first step, when present.
    #[serde(default)]
    pub start_url: Option<String>,

    pub steps: Vec<Step>,
}

/// What a step does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepVerb {
    /// Resolve and store under `context_key` without acting.
    Identify,
    /// Go to the URL in `value`.
    Navigate,
    Reload,
    Click,
    SetValue,
    Clear,
    Toggle,
    TurnOn,
    TurnOff,
    Check,
    Uncheck,
    Select,
    GoToPage,
    Upload,
    DragTo,
    Query,
    /// Select every entry of `values` in a multiple-choice dropdown.
    SelectMany,
    /// Read the table cell at `row` under `column`; `value`, when set, is
    /// the text it must hold.
    ReadCell,
    /// Find the first table row whose `column` cell equals `value`; `row`,
    /// when set, is where it must be.
    FindRow,
}

impl StepVerb {
    pub fn action_kind(&self) -> Option<ActionKind> {
        let kind = match self {
            StepVerb::Identify
            | StepVerb::Navigate
            | StepVerb::Reload
            | StepVerb::SelectMany
            | StepVerb::ReadCell
            | StepVerb::FindRow => return None,
            StepVerb::Click => ActionKind::Click,
            StepVerb::SetValue => ActionKind::SetValue,
            StepVerb::Clear => ActionKind::Clear,
            StepVerb::Toggle => ActionKind::Toggle,
            StepVerb::TurnOn => ActionKind::TurnOn,
            StepVerb::TurnOff => ActionKind::TurnOff,
            StepVerb::Check => ActionKind::Check,
            StepVerb::Uncheck => ActionKind::Uncheck,
            StepVerb::Select => ActionKind::Select,
            StepVerb::GoToPage => ActionKind::GoToPage,
            StepVerb::Upload => ActionKind::Upload,
            StepVerb::DragTo => ActionKind::DragTo,
            StepVerb::Query => ActionKind::Query,
        };
        Some(kind)
    }

    /// Whether the step names an element through its identifier.
    pub fn targets_element(&self) -> bool {
        !matches!(self, StepVerb::Navigate | StepVerb::Reload)
    }
}

/// One `(action, identifier_type, identifier, component, value)` tuple plus
/// context and assertion extras.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub action: StepVerb,

    #[serde(default)]
    pub identifier_type: IdentifierType,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default = "default_component")]
    pub component: String,

    #[serde(default)]
    pub value: Option<String>,

    /// Entries for `select_many`.
    #[serde(default)]
    pub values: Vec<String>,

    /// Group or container the element must sit in.
    #[serde(default, alias = "group", alias = "within")]
    pub scope: Option<String>,

    /// 0-based table row for `read_cell` and `find_row`.
    #[serde(default)]
    pub row: Option<usize>,

    /// Table column header for `read_cell` and `find_row`.
    #[serde(default)]
    pub column: Option<String>,

    /// Store the resolved element under this key.
    #[serde(default)]
    pub context_key: Option<String>,

    /// Act on the element stored under this key instead of resolving.
    #[serde(default)]
    pub use_context: Option<String>,

    #[serde(default)]
    pub include_hidden: bool,

    /// Post-step state the element must show.
    #[serde(default)]
    pub expect: Option<StateExpectation>,

    /// The step must fail with this error kind (`not_found`, ...).
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_component() -> String {
    "any".to_string()
}

impl Step {
    pub fn request(&self) -> IdentificationRequest {
        let request = IdentificationRequest::new(
            self.identifier.clone().unwrap_or_default(),
            self.identifier_type,
            self.component.clone(),
        );
        match &self.scope {
            Some(scope) => request.within(scope.clone()),
            None => request,
        }
    }
}

/// Assertions on a state descriptor. Unset fields are not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StateExpectation {
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub value: Option<String>,
    /// Must be among the selected values.
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl StateExpectation {
    /// One message per unmet field; empty when everything holds.
    pub fn evaluate(&self, state: &StateDescriptor) -> Vec<String> {
        let mut misses = Vec::new();
        let s = &state.state;

        if let Some(want) = self.checked {
            if s.checked != Some(want) {
                misses.push(format!("checked: expected {want}, got {:?}", s.checked));
            }
        }
        if let Some(want) = self.disabled {
            if state.disabled != want {
                misses.push(format!("disabled: expected {want}, got {}", state.disabled));
            }
        }
        if let Some(want) = self.visible {
            if state.visible != want {
                misses.push(format!("visible: expected {want}, got {}", state.visible));
            }
        }
        if let Some(want) = &self.value {
            if s.value.as_deref() != Some(want.as_str()) {
                misses.push(format!("value: expected {want:?}, got {:?}", s.value));
            }
        }
        if let Some(want) = &self.selected {
            let found = s
                .selected_values
                .as_ref()
                .is_some_and(|vals| vals.iter().any(|v| v == want));
            if !found {
                misses.push(format!("selected: expected {want:?} among {:?}", s.selected_values));
            }
        }
        if let Some(want) = self.current_page {
            if s.current_page != Some(want) {
                misses.push(format!("current_page: expected {want}, got {:?}", s.current_page));
            }
        }
        if let Some(want) = &self.variant {
            if s.variant.as_deref() != Some(want.as_str()) {
                misses.push(format!("variant: expected {want:?}, got {:?}", s.variant));
            }
        }
        if let Some(want) = &self.label {
            if state.label != *want {
                misses.push(format!("label: expected {want:?}, got {:?}", state.label));
            }
        }

        misses
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    /// 0-based step index.
    pub index: usize,
    pub action: StepVerb,
    pub passed: bool,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub mutating_calls: u32,
    /// Error kind name when the step failed with an engine error.
    #[serde(default)]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of running a complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub outcomes: Vec<StepOutcome>,
    /// Why the scenario stopped early.
    pub error: Option<String>,
}
