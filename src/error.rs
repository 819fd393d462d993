use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::component::identifier::Blocker;
use crate::locate::request::IdentificationRequest;
use crate::locate::strategy::ResolutionTrace;

/// What was asked for and how the engine went looking for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub request: IdentificationRequest,
    pub trace: ResolutionTrace,
}

impl Diagnostic {
    pub fn new(request: IdentificationRequest, trace: ResolutionTrace) -> Self {
        Diagnostic { request, trace }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kind={} identifier='{}' type={}",
            self.request.component_kind, self.request.raw_identifier, self.request.identifier_type,
        )?;
        if let Some(scope) = &self.request.scope {
            write!(f, " scope='{scope}'")?;
        }
        write!(f, " trace=[{}]", self.trace)
    }
}

/// Failures of resolution and interaction.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no element found: {diagnostic}")]
    NotFound { diagnostic: Diagnostic },

    #[error("{matches} elements match where one was expected: {diagnostic}")]
    AmbiguousMatch { diagnostic: Diagnostic, matches: usize },

    #[error("element is {blocker}: {diagnostic}")]
    NotInteractable {
        diagnostic: Diagnostic,
        blocker: Blocker,
    },

    #[error("{action} failed after {attempts} attempt(s): {source}: {diagnostic}")]
    ActionFailed {
        diagnostic: Diagnostic,
        action: String,
        attempts: u32,
        #[source]
        source: DriverError,
    },

    #[error("{action} did not take effect, expected {expected}, observed {observed}: {diagnostic}")]
    VerificationFailed {
        diagnostic: Diagnostic,
        action: String,
        expected: String,
        observed: String,
    },

    #[error("timed out after {waited_ms}ms waiting for {waiting_for}: {diagnostic}")]
    TimedOut {
        diagnostic: Diagnostic,
        waited_ms: u64,
        waiting_for: String,
    },

    #[error("{action} is not supported: {reason}: {diagnostic}")]
    Unsupported {
        diagnostic: Diagnostic,
        action: String,
        reason: String,
    },

    /// A non-retryable driver failure while serving a request, outside the
    /// mutating call itself.
    #[error("driver failed while {during}: {source}: {diagnostic}")]
    DriverFailed {
        diagnostic: Diagnostic,
        during: String,
        #[source]
        source: DriverError,
    },

    /// A driver failure with no request behind it (navigation, reload).
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl EngineError {
    pub fn driver_failed(diagnostic: &Diagnostic, during: &str, source: DriverError) -> Self {
        EngineError::DriverFailed {
            diagnostic: diagnostic.clone(),
            during: during.to_string(),
            source,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            EngineError::NotFound { diagnostic }
            | EngineError::AmbiguousMatch { diagnostic, .. }
            | EngineError::NotInteractable { diagnostic, .. }
            | EngineError::ActionFailed { diagnostic, .. }
            | EngineError::VerificationFailed { diagnostic, .. }
            | EngineError::TimedOut { diagnostic, .. }
            | EngineError::Unsupported { diagnostic, .. }
            | EngineError::DriverFailed { diagnostic, .. } => Some(diagnostic),
            EngineError::Driver(_) => None,
        }
    }

    /// Stable snake_case name of the variant, for reports and traces.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::AmbiguousMatch { .. } => "ambiguous_match",
            EngineError::NotInteractable { .. } => "not_interactable",
            EngineError::ActionFailed { .. } => "action_failed",
            EngineError::VerificationFailed { .. } => "verification_failed",
            EngineError::TimedOut { .. } => "timed_out",
            EngineError::Unsupported { .. } => "unsupported",
            EngineError::DriverFailed { .. } | EngineError::Driver(_) => "driver",
        }
    }
}

/// Failures reported by a page driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The element was re-rendered or removed between lookup and use.
    #[error("stale element: {0}")]
    StaleElement(String),

    /// Another element received the interaction (overlay, animation).
    #[error("interaction intercepted: {0}")]
    Intercepted(String),

    #[error("driver timeout: {0}")]
    Timeout(String),

    #[error("{command} failed: {message}")]
    Protocol { command: String, message: String },

    #[error("driver I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported by driver: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::StaleElement(_) | DriverError::Intercepted(_) | DriverError::Timeout(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
