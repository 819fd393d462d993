use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::browser::driver::Driver;
use crate::component::kind::KindState;
use crate::component::registry::KindRegistry;
use crate::error::DriverError;
use crate::page::element::{Candidate, RawElement};
use crate::page::normalize::label_for;

// ============================================================================
// State descriptor
// ============================================================================

/// Normalized, immutable snapshot of a candidate's semantic state.
///
/// The shared fields are always populated. Kind-specific fields live in
/// `state` and stay `None` when the kind is unknown or does not model them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Kind whose extractor produced `state`; `None` for unrecognized kinds.
    pub kind: Option<String>,
    pub disabled: bool,
    pub loading: bool,
    pub visible: bool,
    pub attached: bool,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(flatten)]
    pub state: KindState,
}

/// Why a candidate cannot be acted on right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    Detached,
    Hidden,
    Disabled,
    Loading,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Blocker::Detached => "detached from the page",
            Blocker::Hidden => "hidden",
            Blocker::Disabled => "disabled",
            Blocker::Loading => "loading",
        };
        f.write_str(s)
    }
}

impl StateDescriptor {
    /// Attached, visible, enabled and not loading.
    pub fn interactable(&self) -> bool {
        self.blocker().is_none()
    }

    /// First unmet precondition, checked in the order an action needs them.
    pub fn blocker(&self) -> Option<Blocker> {
        if !self.attached {
            Some(Blocker::Detached)
        } else if !self.visible {
            Some(Blocker::Hidden)
        } else if self.disabled {
            Some(Blocker::Disabled)
        } else if self.loading {
            Some(Blocker::Loading)
        } else {
            None
        }
    }

    pub fn checked(&self) -> Option<bool> {
        self.state.checked
    }
}

// ============================================================================
// Property identifier
// ============================================================================

/// Disabled through the attribute, ARIA, or a `*-disabled` class token.
fn shared_disabled(el: &RawElement) -> bool {
    el.has_attribute("disabled")
        || el.aria_flag("disabled") == Some(true)
        || el.has_class("disabled")
        || el.has_class_suffix("-disabled")
}

/// Busy through ARIA, or a `*-loading` class token.
fn shared_loading(el: &RawElement) -> bool {
    el.aria_flag("busy") == Some(true) || el.has_class("loading") || el.has_class_suffix("-loading")
}

/// Describe a raw element as an instance of `kind`.
///
/// Shared extraction always runs; the kind's extractor is merged on top
/// when the registry knows `kind`.
pub fn describe_raw(raw: &RawElement, kind: &str, registry: &KindRegistry) -> StateDescriptor {
    let descriptor = registry.get(kind);

    let state = match descriptor {
        Some(d) => {
            let mut state = (d.extract)(raw);
            if let Some(variant) = raw.attribute(d.variant_attribute) {
                state.variant = Some(variant.trim().to_string());
            }
            state
        }
        None => KindState::default(),
    };

    StateDescriptor {
        kind: descriptor.map(|d| d.name.to_string()),
        disabled: shared_disabled(raw),
        loading: shared_loading(raw),
        visible: raw.is_rendered(),
        attached: raw.attached,
        label: label_for(raw),
        marker: raw.marker.clone(),
        state,
    }
}

/// Describe a candidate from its discovery snapshot, without touching the
/// live page.
pub fn describe(candidate: &Candidate, kind: &str, registry: &KindRegistry) -> StateDescriptor {
    describe_raw(&candidate.raw, kind, registry)
}

/// Describe a candidate against the live page.
///
/// Re-reads the element through the driver and, when the kind declares a
/// live probe, runs it and merges its result. An element the driver no
/// longer finds is described from its last snapshot as detached.
pub fn describe_live<D: Driver + ?Sized>(
    driver: &mut D,
    candidate: &Candidate,
    kind: &str,
    registry: &KindRegistry,
) -> Result<StateDescriptor, DriverError> {
    let Some(mut raw) = driver.refresh(candidate.handle())? else {
        debug!(handle = %candidate.handle(), "element no longer attached");
        let mut raw = candidate.raw.clone();
        raw.attached = false;
        return Ok(describe_raw(&raw, kind, registry));
    };

    if let Some(probe) = registry.get(kind).and_then(|d| d.live_probe) {
        match driver.execute_script(probe, Some(candidate.handle()))? {
            Value::Object(map) => raw.properties.extend(map),
            Value::Null => {}
            other => {
                debug!(handle = %candidate.handle(), result = %other, "live probe returned a non-object");
            }
        }
    }

    Ok(describe_raw(&raw, kind, registry))
}
