use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locate::request::IdentifierType;

/// One way of narrowing the candidate pool to a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Element Context lookup by caller key.
    Context,
    Marker,
    ExactLabel,
    FuzzyLabel,
    Variant,
    Position,
    /// Identifier slug against the last segment of structured marker values.
    MarkerSlug,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Context => "context",
            Strategy::Marker => "marker",
            Strategy::ExactLabel => "exact_label",
            Strategy::FuzzyLabel => "fuzzy_label",
            Strategy::Variant => "variant",
            Strategy::Position => "position",
            Strategy::MarkerSlug => "marker_slug",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategies tried for an identifier type, in order.
pub fn plan(identifier_type: IdentifierType) -> &'static [Strategy] {
    match identifier_type {
        IdentifierType::Marker => &[Strategy::Marker],
        IdentifierType::Label => &[Strategy::ExactLabel, Strategy::FuzzyLabel],
        IdentifierType::Variant => &[Strategy::Variant],
        IdentifierType::Position => &[Strategy::Position],
        IdentifierType::Auto => &[
            Strategy::Marker,
            Strategy::ExactLabel,
            Strategy::FuzzyLabel,
            Strategy::MarkerSlug,
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    /// Candidates the strategy matched before tie-breaking.
    pub candidates: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Ordered record of every strategy a resolution tried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTrace {
    attempts: Vec<StrategyAttempt>,
}

impl ResolutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, strategy: Strategy, candidates: usize) {
        self.attempts.push(StrategyAttempt {
            strategy,
            candidates,
            note: None,
        });
    }

    /// Record an attempt that carries an explanation, such as a malformed
    /// position or a hidden-only match.
    pub fn note(&mut self, strategy: Strategy, candidates: usize, note: impl Into<String>) {
        self.attempts.push(StrategyAttempt {
            strategy,
            candidates,
            note: Some(note.into()),
        });
    }

    pub fn attempts(&self) -> &[StrategyAttempt] {
        &self.attempts
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        self.attempts.iter().map(|a| a.strategy).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn extend(&mut self, other: &ResolutionTrace) {
        self.attempts.extend(other.attempts.iter().cloned());
    }
}

impl fmt::Display for ResolutionTrace {
    /// `marker:0 > exact_label:2`, with notes in parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return f.write_str("(no strategy attempted)");
        }
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}:{}", attempt.strategy, attempt.candidates)?;
            if let Some(note) = &attempt.note {
                write!(f, " ({note})")?;
            }
        }
        Ok(())
    }
}
