use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;
use tracing::debug;

use crate::locate::request::IdentificationRequest;
use crate::page::element::Candidate;
use crate::page::pattern_index::Generation;

/// An element resolved earlier in the scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub key: String,
    pub candidate: Candidate,
    pub component_kind: String,
    pub resolved_generation: Generation,
    /// Request that produced the entry, used to re-resolve it once stale.
    pub request: Option<IdentificationRequest>,
}

impl ContextEntry {
    pub fn is_stale(&self, current: Generation) -> bool {
        self.resolved_generation != current
    }
}

/// Result of a context lookup against the current DOM generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextLookup<'a> {
    Fresh(&'a ContextEntry),
    /// Resolved in an older generation. Must be re-resolved, not acted on.
    Stale(&'a ContextEntry),
    Absent,
}

impl<'a> ContextLookup<'a> {
    pub fn fresh(self) -> Option<&'a ContextEntry> {
        match self {
            ContextLookup::Fresh(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ContextLookup::Stale(_))
    }
}

/// Scenario-scoped table of resolved elements keyed by caller-chosen names.
///
/// One value per scenario; the harness calls `reset` at every scenario
/// boundary. Not shared across driver sessions.
#[derive(Debug, Default)]
pub struct ElementContext {
    entries: HashMap<String, ContextEntry>,
    current: Option<String>,
}

impl ElementContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `candidate` under `key`, replacing any previous entry. The first
    /// stored entry becomes the current one.
    pub fn put(
        &mut self,
        key: impl Into<String>,
        candidate: Candidate,
        component_kind: impl Into<String>,
        generation: Generation,
    ) -> &mut ContextEntry {
        let key = key.into();
        debug!(key = %key, generation, handle = %candidate.handle(), "context entry stored");

        if self.current.is_none() {
            self.current = Some(key.clone());
        }

        let entry = ContextEntry {
            key: key.clone(),
            candidate,
            component_kind: component_kind.into(),
            resolved_generation: generation,
            request: None,
        };
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    /// Look `key` up, classifying it against `current_generation`.
    pub fn get(&self, key: &str, current_generation: Generation) -> ContextLookup<'_> {
        match self.entries.get(key) {
            Some(entry) if entry.is_stale(current_generation) => ContextLookup::Stale(entry),
            Some(entry) => ContextLookup::Fresh(entry),
            None => ContextLookup::Absent,
        }
    }

    pub fn reset(&mut self) {
        if !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "context reset");
        }
        self.entries.clear();
        self.current = None;
    }

    /// Make an existing entry the current one. Returns false for unknown keys.
    pub fn set_current(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            self.current = Some(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&ContextEntry> {
        self.current.as_ref().and_then(|k| self.entries.get(k))
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
