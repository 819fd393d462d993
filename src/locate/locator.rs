use serde::Serialize;
use tracing::{debug, warn};

use crate::component::identifier::{Blocker, describe};
use crate::component::registry::KindRegistry;
use crate::error::{Diagnostic, EngineError};
use crate::locate::request::IdentificationRequest;
use crate::locate::strategy::{ResolutionTrace, Strategy, plan};
use crate::page::element::{Candidate, is_wildcard_kind};
use crate::page::marker::MarkerPattern;
use crate::page::normalize::{label_sources, normalize_text, slugify};
use crate::page::pattern_index::{Generation, PatternIndex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Let hidden and zero-size elements into the candidate pools. Used for
    /// presence-only checks.
    pub include_hidden: bool,
}

impl ResolveOptions {
    pub fn including_hidden() -> Self {
        ResolveOptions {
            include_hidden: true,
        }
    }
}

/// The single candidate a resolution chose, and how.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub candidate: Candidate,
    pub strategy: Strategy,
    pub trace: ResolutionTrace,
    pub generation: Generation,
}

/// Turns an identification request into exactly one candidate.
pub struct ElementLocator<'a> {
    registry: &'a KindRegistry,
}

impl<'a> ElementLocator<'a> {
    pub fn new(registry: &'a KindRegistry) -> Self {
        ElementLocator { registry }
    }

    /// Resolve `request` against `index`.
    ///
    /// Strategies run in the order the identifier type prescribes and the
    /// first one with a match decides. A marker hit returns at once and a
    /// duplicated marker is an `AmbiguousMatch`. Every other strategy sees
    /// only rendered candidates of the requested kind unless
    /// `include_hidden` is set; a request that matches nothing but a
    /// hidden element fails `NotInteractable`. A request scope narrows
    /// those pools to one named group; marker hits ignore it.
    pub fn resolve(
        &self,
        index: &PatternIndex,
        request: &IdentificationRequest,
        options: &ResolveOptions,
    ) -> Result<Resolution, EngineError> {
        let mut trace = ResolutionTrace::new();
        let kind = request.component_kind.as_str();
        let identifier = request.raw_identifier.trim();
        let steps = plan(request.identifier_type);

        if steps.contains(&Strategy::Marker) {
            let hits = index.by_marker(identifier);
            trace.record(Strategy::Marker, hits.len());
            match hits.as_slice() {
                [] => {}
                [found] => {
                    if !is_wildcard_kind(kind) && !found.is_kind(kind) {
                        warn!(
                            marker = identifier,
                            requested = kind,
                            actual = ?found.kind,
                            "marker resolved to an element of another kind"
                        );
                    }
                    if !options.include_hidden && !found.is_rendered() {
                        return Err(EngineError::NotInteractable {
                            diagnostic: Diagnostic::new(request.clone(), trace),
                            blocker: hidden_blocker(found),
                        });
                    }
                    return Ok(self.chosen(index, found, Strategy::Marker, trace));
                }
                many => {
                    return Err(EngineError::AmbiguousMatch {
                        diagnostic: Diagnostic::new(request.clone(), trace),
                        matches: many.len(),
                    });
                }
            }
        }

        let scope = request.scope.as_deref();
        let in_scope = |c: &&Candidate| scope.is_none_or(|s| c.in_group(s));
        let pool: Vec<&Candidate> = index
            .of_kind(kind)
            .filter(in_scope)
            .filter(|c| options.include_hidden || c.is_rendered())
            .collect();

        for &strategy in steps.iter().filter(|s| **s != Strategy::Marker) {
            if let Some(found) = self.apply(strategy, index, &pool, identifier, &mut trace) {
                return Ok(self.chosen(index, found, strategy, trace));
            }
        }

        if !options.include_hidden {
            let hidden: Vec<&Candidate> = index
                .of_kind(kind)
                .filter(in_scope)
                .filter(|c| !c.is_rendered())
                .collect();
            let mut scratch = ResolutionTrace::new();
            for &strategy in steps
                .iter()
                .filter(|s| !matches!(s, Strategy::Marker | Strategy::Position))
            {
                if let Some(found) = self.apply(strategy, index, &hidden, identifier, &mut scratch) {
                    trace.note(strategy, 1, "matched only a hidden element");
                    return Err(EngineError::NotInteractable {
                        diagnostic: Diagnostic::new(request.clone(), trace),
                        blocker: hidden_blocker(found),
                    });
                }
            }
        }

        debug!(request = %request, trace = %trace, "no candidate survived");
        Err(EngineError::NotFound {
            diagnostic: Diagnostic::new(request.clone(), trace),
        })
    }

    fn chosen(
        &self,
        index: &PatternIndex,
        candidate: &Candidate,
        strategy: Strategy,
        trace: ResolutionTrace,
    ) -> Resolution {
        debug!(
            handle = %candidate.handle(),
            strategy = %strategy,
            trace = %trace,
            "resolved"
        );
        Resolution {
            candidate: candidate.clone(),
            strategy,
            trace,
            generation: index.generation(),
        }
    }

    /// Run one non-marker strategy over `pool` (document order) and record
    /// how many candidates it matched.
    fn apply<'c>(
        &self,
        strategy: Strategy,
        index: &'c PatternIndex,
        pool: &[&'c Candidate],
        identifier: &str,
        trace: &mut ResolutionTrace,
    ) -> Option<&'c Candidate> {
        match strategy {
            Strategy::ExactLabel => {
                let wanted = normalize_text(identifier);
                let matches: Vec<&Candidate> = if wanted.is_empty() {
                    Vec::new()
                } else {
                    index
                        .by_label(&wanted)
                        .into_iter()
                        .filter(|c| pool.iter().any(|p| p.order == c.order))
                        .collect()
                };
                trace.record(strategy, matches.len());
                matches.first().copied()
            }
            Strategy::FuzzyLabel => {
                let needle = normalize_text(identifier).to_lowercase();
                // Each match is ranked by the shortest of its sources that
                // contains the needle.
                let matches: Vec<(usize, &Candidate)> = if needle.is_empty() {
                    Vec::new()
                } else {
                    pool.iter()
                        .copied()
                        .filter_map(|c| {
                            label_sources(&c.raw)
                                .iter()
                                .filter(|s| s.to_lowercase().contains(&needle))
                                .map(|s| s.chars().count())
                                .min()
                                .map(|len| (len, c))
                        })
                        .collect()
                };
                trace.record(strategy, matches.len());
                matches
                    .into_iter()
                    .min_by_key(|(len, c)| (*len, c.order))
                    .map(|(_, c)| c)
            }
            Strategy::Variant => {
                let matches: Vec<&Candidate> = pool
                    .iter()
                    .copied()
                    .filter(|c| {
                        let kind = c.kind.as_deref().unwrap_or_default();
                        describe(c, kind, self.registry)
                            .state
                            .variant
                            .is_some_and(|v| v.eq_ignore_ascii_case(identifier))
                    })
                    .collect();
                trace.record(strategy, matches.len());
                matches.first().copied()
            }
            Strategy::Position => match identifier.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    let found = pool.get(n - 1).copied();
                    if found.is_none() {
                        trace.note(strategy, 0, format!("{} candidate(s), position {n} out of range", pool.len()));
                    } else {
                        trace.record(strategy, 1);
                    }
                    found
                }
                _ => {
                    trace.note(strategy, 0, "position must be a positive integer");
                    None
                }
            },
            Strategy::MarkerSlug => {
                let slug = slugify(identifier);
                let matches: Vec<&Candidate> = pool
                    .iter()
                    .copied()
                    .filter(|c| {
                        c.marker()
                            .and_then(MarkerPattern::parse)
                            .is_some_and(|p| p.slug_matches(&slug))
                    })
                    .collect();
                trace.record(strategy, matches.len());
                matches.first().copied()
            }
            Strategy::Marker | Strategy::Context => {
                trace.record(strategy, 0);
                None
            }
        }
    }
}

fn hidden_blocker(candidate: &Candidate) -> Blocker {
    if candidate.raw.attached {
        Blocker::Hidden
    } else {
        Blocker::Detached
    }
}
