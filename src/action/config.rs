use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::retry::DelayPolicy;

/// Timing and retry settings of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ceiling for waiting on an element to become interactable.
    #[serde(default = "default_precondition_timeout")]
    pub precondition_timeout_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Tries per driver interaction call, the first one included.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default)]
    pub retry_delay: DelayPolicy,

    /// How long a post-action state may take to appear.
    #[serde(default = "default_verify_settle")]
    pub verify_settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precondition_timeout_ms: default_precondition_timeout(),
            poll_interval_ms: default_poll_interval(),
            retry_attempts: default_retry_attempts(),
            retry_delay: DelayPolicy::default(),
            verify_settle_ms: default_verify_settle(),
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn verify_settle(&self) -> Duration {
        Duration::from_millis(self.verify_settle_ms)
    }
}

fn default_precondition_timeout() -> u64 { 10_000 }
fn default_poll_interval() -> u64 { 100 }
fn default_retry_attempts() -> u32 { 3 }
fn default_verify_settle() -> u64 { 1_500 }

/// Per-call overrides for `Engine::act`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActOptions {
    #[serde(default)]
    pub include_hidden: bool,

    /// Store the resolved element in the Element Context under this key.
    #[serde(default)]
    pub context_key: Option<String>,

    /// Overrides `EngineConfig::precondition_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Compare the post-action state with the expected one.
    #[serde(default = "default_true")]
    pub verify: bool,
}

impl Default for ActOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            context_key: None,
            timeout_ms: None,
            verify: true,
        }
    }
}

impl ActOptions {
    pub fn store_as(key: impl Into<String>) -> Self {
        Self {
            context_key: Some(key.into()),
            ..Self::default()
        }
    }
}

fn default_true() -> bool { true }
