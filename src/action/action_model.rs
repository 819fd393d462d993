use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::identifier::StateDescriptor;
use crate::locate::request::IdentificationRequest;
use crate::locate::strategy::{ResolutionTrace, Strategy};
use crate::page::element::ElementHandle;
use crate::page::normalize::normalize_text;
use crate::page::pattern_index::Generation;

// ============================================================================
// Action kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    SetValue,
    Clear,
    Toggle,
    TurnOn,
    TurnOff,
    Check,
    Uncheck,
    /// Open a selector and pick an option or tree node by label.
    Select,
    GoToPage,
    Upload,
    /// Drag the element onto another one, named by label.
    DragTo,
    /// Describe only; never touches the page.
    Query,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::SetValue => "set_value",
            ActionKind::Clear => "clear",
            ActionKind::Toggle => "toggle",
            ActionKind::TurnOn => "turn_on",
            ActionKind::TurnOff => "turn_off",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::Select => "select",
            ActionKind::GoToPage => "go_to_page",
            ActionKind::Upload => "upload",
            ActionKind::DragTo => "drag_to",
            ActionKind::Query => "query",
        }
    }

    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            ActionKind::SetValue
                | ActionKind::Select
                | ActionKind::GoToPage
                | ActionKind::Upload
                | ActionKind::DragTo
        )
    }

    /// Target of the idempotent binary actions.
    pub fn binary_target(&self) -> Option<bool> {
        match self {
            ActionKind::TurnOn | ActionKind::Check => Some(true),
            ActionKind::TurnOff | ActionKind::Uncheck => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Expected post-states
// ============================================================================

/// State an action must leave the element in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Checked(bool),
    Value(String),
    Selected(String),
    Page(u32),
    Entry(String),
}

impl Expectation {
    /// Expected post-state of `action`, or `None` when the action has no
    /// observable effect on the element itself.
    pub fn for_action(action: ActionKind, before: &StateDescriptor, value: Option<&str>) -> Option<Self> {
        match action {
            ActionKind::TurnOn | ActionKind::Check => Some(Expectation::Checked(true)),
            ActionKind::TurnOff | ActionKind::Uncheck => Some(Expectation::Checked(false)),
            ActionKind::Toggle => before.checked().map(|c| Expectation::Checked(!c)),
            ActionKind::SetValue => value.map(|v| Expectation::Value(v.to_string())),
            ActionKind::Clear => Some(Expectation::Value(String::new())),
            ActionKind::Select => value.map(|v| Expectation::Selected(normalize_text(v))),
            ActionKind::GoToPage => value.and_then(|v| v.trim().parse().ok()).map(Expectation::Page),
            ActionKind::Upload => value.map(|v| {
                let name = Path::new(v)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| v.to_string());
                Expectation::Entry(name)
            }),
            ActionKind::Click | ActionKind::DragTo | ActionKind::Query => None,
        }
    }

    pub fn is_met(&self, state: &StateDescriptor) -> bool {
        let s = &state.state;
        match self {
            Expectation::Checked(want) => s.checked == Some(*want),
            Expectation::Value(want) => s.value.as_deref().unwrap_or_default() == want,
            Expectation::Selected(want) => {
                s.selected_values
                    .as_ref()
                    .is_some_and(|vals| vals.iter().any(|v| normalize_text(v) == *want))
                    || s.value.as_deref().map(normalize_text).as_deref() == Some(want.as_str())
            }
            Expectation::Page(want) => s.current_page == Some(*want),
            Expectation::Entry(want) => s
                .entries
                .as_ref()
                .is_some_and(|entries| entries.iter().any(|e| e == want)),
        }
    }

    /// The part of `state` this expectation looks at, for error messages.
    pub fn observed(&self, state: &StateDescriptor) -> String {
        let s = &state.state;
        match self {
            Expectation::Checked(_) => format!("checked={:?}", s.checked),
            Expectation::Value(_) => format!("value={:?}", s.value),
            Expectation::Selected(_) => format!("selected={:?}", s.selected_values),
            Expectation::Page(_) => format!("current_page={:?}", s.current_page),
            Expectation::Entry(_) => format!("entries={:?}", s.entries),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Checked(v) => write!(f, "checked={v}"),
            Expectation::Value(v) => write!(f, "value={v:?}"),
            Expectation::Selected(v) => write!(f, "selected contains {v:?}"),
            Expectation::Page(v) => write!(f, "current_page={v}"),
            Expectation::Entry(v) => write!(f, "entries contain {v:?}"),
        }
    }
}

// ============================================================================
// Action result
// ============================================================================

/// Outcome of one successful `act` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub request: IdentificationRequest,
    pub action: ActionKind,
    pub handle: ElementHandle,
    pub strategy: Strategy,
    pub trace: ResolutionTrace,
    /// State observed once the preconditions held.
    pub before: StateDescriptor,
    /// State observed after the action; `None` when not re-read.
    pub after: Option<StateDescriptor>,
    /// Mutating driver invocations, retries included.
    pub mutating_calls: u32,
    /// Attempts of the last interaction call.
    pub attempts: u32,
    /// The element already was in the target state; nothing was done.
    pub already_satisfied: bool,
    /// DOM generation once the action finished.
    pub generation: Generation,
}

impl ActionResult {
    /// State after the action, falling back to the state before it.
    pub fn state(&self) -> &StateDescriptor {
        self.after.as_ref().unwrap_or(&self.before)
    }
}
