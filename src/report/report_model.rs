use serde::{Deserialize, Serialize};

use crate::scenario::scenario_model::{ScenarioResult, StepOutcome};

// ============================================================================
// Suite report: scenario results of one run
// ============================================================================

/// Scenario results of one run with their pass/fail tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite_name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Steps executed over all scenarios, failing ones included.
    pub steps_run: usize,
    /// Mutating driver calls over all steps.
    pub mutating_calls: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn from_results(suite_name: &str, results: Vec<ScenarioResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        SuiteReport {
            suite_name: suite_name.to_string(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            steps_run: results.iter().map(|r| r.steps_run).sum(),
            mutating_calls: results
                .iter()
                .flat_map(|r| &r.outcomes)
                .map(|o| o.mutating_calls)
                .sum(),
            duration_ms: None,
            results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl ScenarioResult {
    /// Outcomes of the steps that failed, in execution order.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}
