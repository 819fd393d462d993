use std::collections::BTreeMap;

use serde::Serialize;

use crate::component::identifier::{StateDescriptor, describe};
use crate::component::registry::KindRegistry;
use crate::page::pattern_index::{Generation, PatternIndex};

/// State counts of the candidates of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub total: usize,
    pub visible: usize,
    pub disabled: usize,
    pub loading: usize,
    /// Only for kinds that model a checked state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub order: usize,
    pub kind: String,
    pub handle: String,
    pub marker: Option<String>,
    pub state: StateDescriptor,
}

/// Structured digest of a pattern index for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub generation: Generation,
    pub total: usize,
    pub by_kind: BTreeMap<String, KindCounts>,
    pub duplicate_markers: Vec<String>,
    pub elements: Vec<SummaryEntry>,
}

impl IndexSummary {
    /// Describe every classified candidate of `index` from its snapshot.
    pub fn build(index: &PatternIndex, registry: &KindRegistry) -> Self {
        let mut by_kind: BTreeMap<String, KindCounts> = BTreeMap::new();
        let mut elements = Vec::new();

        for candidate in index.candidates() {
            let Some(kind) = candidate.kind.as_deref() else {
                continue;
            };
            let state = describe(candidate, kind, registry);

            let counts = by_kind.entry(kind.to_string()).or_default();
            counts.total += 1;
            counts.visible += usize::from(state.visible);
            counts.disabled += usize::from(state.disabled);
            counts.loading += usize::from(state.loading);
            if let Some(checked) = state.checked() {
                *counts.checked.get_or_insert(0) += usize::from(checked);
            }

            elements.push(SummaryEntry {
                order: candidate.order,
                kind: kind.to_string(),
                handle: candidate.handle().to_string(),
                marker: candidate.marker().map(str::to_string),
                state,
            });
        }

        IndexSummary {
            generation: index.generation(),
            total: elements.len(),
            by_kind,
            duplicate_markers: index.duplicate_markers().into_iter().map(str::to_string).collect(),
            elements,
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.by_kind.get(kind).map_or(0, |c| c.total)
    }
}
