use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::browser::driver::Driver;
use crate::component::registry::KindRegistry;
use crate::page::element::{Candidate, RawElement, is_wildcard_kind};
use crate::page::marker::MarkerPattern;
use crate::page::normalize::{label_for, label_sources};

/// Monotonic page counter, bumped on every navigation or reload.
pub type Generation = u64;

// ============================================================================
// Pattern Index: one discovery snapshot per DOM generation
// ============================================================================

/// Discovery snapshot of the page for one DOM generation.
///
/// Holds every classified element, hidden and disabled ones included, with
/// two lookups: marker value to candidates, and each normalized label
/// source to candidates in document order. The marker map keeps every
/// element that carries a value so that a duplicated marker stays
/// observable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternIndex {
    generation: Generation,
    kind_filter: Option<String>,
    candidates: Vec<Candidate>,
    #[serde(skip)]
    markers: HashMap<String, Vec<usize>>,
    #[serde(skip)]
    labels: HashMap<String, Vec<usize>>,
    fingerprint: String,
}

impl PatternIndex {
    /// Build an index from one traversal. `elements` must be in document
    /// order. With a `kind_filter`, only elements classified as that kind
    /// are kept.
    pub fn build(
        generation: Generation,
        elements: Vec<RawElement>,
        registry: &KindRegistry,
        kind_filter: Option<&str>,
    ) -> Self {
        let mut candidates = Vec::new();

        for (order, raw) in elements.into_iter().enumerate() {
            let kind = registry.classify(&raw).map(str::to_string);

            if let Some(filter) = kind_filter {
                let keep = match kind.as_deref() {
                    Some(k) => is_wildcard_kind(filter) || k == filter,
                    None => false,
                };
                if !keep {
                    continue;
                }
            }

            let label = label_for(&raw);
            candidates.push(Candidate {
                raw,
                order,
                kind,
                label,
            });
        }

        let mut markers: HashMap<String, Vec<usize>> = HashMap::new();
        let mut labels: HashMap<String, Vec<usize>> = HashMap::new();

        for (slot, candidate) in candidates.iter().enumerate() {
            if let Some(marker) = candidate.marker().map(str::trim).filter(|m| !m.is_empty()) {
                markers.entry(marker.to_string()).or_default().push(slot);
            }
            for source in label_sources(&candidate.raw) {
                labels.entry(source).or_default().push(slot);
            }
        }

        let fingerprint = fingerprint(&candidates);

        PatternIndex {
            generation,
            kind_filter: kind_filter.map(str::to_string),
            candidates,
            markers,
            labels,
            fingerprint,
        }
    }

    pub fn empty(generation: Generation) -> Self {
        PatternIndex::build(generation, Vec::new(), &KindRegistry::empty(), None)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn kind_filter(&self) -> Option<&str> {
        self.kind_filter.as_deref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Content hash of the snapshot; equal for equal contents.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Every candidate carrying `marker`. More than one entry is a page
    /// defect that callers must surface, not disambiguate.
    pub fn by_marker(&self, marker: &str) -> Vec<&Candidate> {
        self.markers
            .get(marker.trim())
            .map(|slots| slots.iter().map(|&i| &self.candidates[i]).collect())
            .unwrap_or_default()
    }

    /// Candidates with any label source (ARIA label, form label, visible
    /// text, placeholder) equal to `label`, in document order.
    pub fn by_label(&self, label: &str) -> Vec<&Candidate> {
        self.labels
            .get(label)
            .map(|slots| slots.iter().map(|&i| &self.candidates[i]).collect())
            .unwrap_or_default()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Candidate> + 'a {
        self.candidates.iter().filter(move |c| c.is_kind(kind))
    }

    /// Marker values that occur on more than one element.
    pub fn duplicate_markers(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = self
            .markers
            .iter()
            .filter(|(_, slots)| slots.len() > 1)
            .map(|(m, _)| m.as_str())
            .collect();
        dups.sort_unstable();
        dups
    }

    /// Parsed structure of every marker value, in document order.
    pub fn marker_patterns(&self) -> Vec<(&Candidate, MarkerPattern)> {
        self.candidates
            .iter()
            .filter_map(|c| c.marker().and_then(MarkerPattern::parse).map(|p| (c, p)))
            .collect()
    }
}

fn fingerprint(candidates: &[Candidate]) -> String {
    let mut hasher = Sha1::new();
    for c in candidates {
        // Serializing a plain data struct cannot fail.
        if let Ok(bytes) = serde_json::to_vec(c) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Per-generation cache
// ============================================================================

/// Caches pattern indexes keyed by DOM generation and kind filter.
///
/// A request for a newer generation drops every cached index. Failed
/// traversals are not cached.
#[derive(Debug, Default)]
pub struct IndexCache {
    generation: Option<Generation>,
    entries: HashMap<Option<String>, Arc<PatternIndex>>,
    traversals: usize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index for `generation`, traversing the page only on a
    /// cache miss. Never fails: a driver error yields an empty index.
    pub fn discover<D: Driver + ?Sized>(
        &mut self,
        driver: &mut D,
        registry: &KindRegistry,
        generation: Generation,
        kind: Option<&str>,
    ) -> Arc<PatternIndex> {
        if self.generation != Some(generation) {
            self.entries.clear();
            self.generation = Some(generation);
        }

        let key = kind.map(str::to_string);
        if let Some(index) = self.entries.get(&key) {
            debug!(generation, kind = ?kind, "pattern index cache hit");
            return Arc::clone(index);
        }

        self.traversals += 1;
        match driver.snapshot() {
            Ok(elements) => {
                let index = Arc::new(PatternIndex::build(generation, elements, registry, kind));
                debug!(
                    generation,
                    kind = ?kind,
                    candidates = index.len(),
                    "pattern index built"
                );
                for marker in index.duplicate_markers() {
                    warn!(generation, marker, "marker value occurs on more than one element");
                }
                self.entries.insert(key, Arc::clone(&index));
                index
            }
            Err(e) => {
                warn!(generation, error = %e, "page traversal failed, using empty index");
                Arc::new(PatternIndex::build(generation, Vec::new(), registry, kind))
            }
        }
    }

    /// Drop every cached index.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.generation = None;
    }

    /// Number of page traversals performed so far.
    pub fn traversals(&self) -> usize {
        self.traversals
    }
}
