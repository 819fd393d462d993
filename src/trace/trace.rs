use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::locate::request::IdentificationRequest;
use crate::page::pattern_index::Generation;

/// One line of the action trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub scenario: String,
    pub step: usize,
    pub action: String,

    pub request: Option<IdentificationRequest>,
    pub strategy: Option<String>,
    pub trace: Option<String>,
    pub generation: Option<Generation>,

    pub outcome: String,
    pub message: Option<String>,
}

impl TraceEvent {
    pub fn now(scenario: &str, step: usize, action: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            scenario: scenario.to_string(),
            step,
            action: action.to_string(),
            request: None,
            strategy: None,
            trace: None,
            generation: None,
            outcome: "ok".to_string(),
            message: None,
        }
    }

    pub fn with_request(mut self, request: &IdentificationRequest) -> Self {
        self.request = Some(request.clone());
        self
    }

    pub fn with_resolution(mut self, strategy: impl ToString, trace: impl ToString) -> Self {
        self.strategy = Some(strategy.to_string());
        self.trace = Some(trace.to_string());
        self
    }

    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString, message: Option<String>) -> Self {
        self.outcome = outcome.to_string();
        self.message = message;
        self
    }
}
