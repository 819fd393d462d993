use tracing::{debug, info};

use crate::action::config::ActOptions;
use crate::action::handler::Engine;
use crate::browser::driver::Driver;
use crate::component::identifier::StateDescriptor;
use crate::context::element_context::ElementContext;
use crate::error::EngineError;
use crate::locate::locator::ResolveOptions;
use crate::locate::strategy::Strategy;
use crate::page::normalize::normalize_text;
use crate::scenario::scenario_model::{Scenario, ScenarioResult, Step, StepOutcome, StepVerb};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// What a successful step produced.
struct StepReport {
    strategy: Option<Strategy>,
    trace: Option<String>,
    mutating_calls: u32,
    state: Option<StateDescriptor>,
    /// Checks of read steps that did not hold.
    misses: Vec<String>,
}

impl StepReport {
    fn empty() -> Self {
        StepReport {
            strategy: None,
            trace: None,
            mutating_calls: 0,
            state: None,
            misses: Vec::new(),
        }
    }
}

/// Executes scenarios step by step against one engine.
pub struct ScenarioRunner;

impl ScenarioRunner {
    /// Run a scenario. The Element Context is reset first, so nothing
    /// resolved by an earlier scenario is visible. Stops at the first
    /// failing step.
    pub fn run<D: Driver>(
        scenario: &Scenario,
        engine: &mut Engine<D>,
        ctx: &mut ElementContext,
        tracer: &TraceLogger,
    ) -> ScenarioResult {
        ctx.reset();
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario started");

        if let Some(url) = &scenario.start_url {
            if let Err(e) = engine.navigate(url) {
                return ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: 0,
                    outcomes: Vec::new(),
                    error: Some(format!("Failed to navigate to start_url: {}", e)),
                };
            }
        }

        let mut outcomes = Vec::new();
        for (i, step) in scenario.steps.iter().enumerate() {
            let outcome = Self::run_step(&scenario.name, i, step, engine, ctx, tracer);
            let passed = outcome.passed;
            let message = outcome.message.clone();
            outcomes.push(outcome);

            if !passed {
                return ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: i + 1,
                    outcomes,
                    error: Some(format!(
                        "Step {} failed: {}",
                        i,
                        message.unwrap_or_else(|| "unknown failure".to_string())
                    )),
                };
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            passed: true,
            steps_run: scenario.steps.len(),
            outcomes,
            error: None,
        }
    }

    fn run_step<D: Driver>(
        scenario: &str,
        index: usize,
        step: &Step,
        engine: &mut Engine<D>,
        ctx: &mut ElementContext,
        tracer: &TraceLogger,
    ) -> StepOutcome {
        let result = Self::execute_step(step, engine, ctx);

        let mut event = TraceEvent::now(scenario, index, format!("{:?}", step.action))
            .with_generation(engine.generation());
        if step.action.targets_element() {
            event = event.with_request(&step.request());
        }

        let outcome = match result {
            Ok(report) => {
                if let (Some(strategy), Some(trace)) = (report.strategy, &report.trace) {
                    event = event.with_resolution(strategy, trace);
                }
                Self::judge_success(index, step, report)
            }
            Err(e) => Self::judge_failure(index, step, &e),
        };

        let status = if outcome.passed { "pass" } else { "fail" };
        tracer.log(&event.with_outcome(status, outcome.message.clone()));
        debug!(scenario, step = index, passed = outcome.passed, "step finished");
        outcome
    }

    fn judge_success(index: usize, step: &Step, report: StepReport) -> StepOutcome {
        let mut message = None;
        let mut passed = true;

        if let Some(kind) = &step.expect_error {
            passed = false;
            message = Some(format!("expected {} error, step succeeded", kind));
        } else if !report.misses.is_empty() {
            passed = false;
            message = Some(report.misses.join("; "));
        } else if let Some(expect) = &step.expect {
            let misses = match &report.state {
                Some(state) => expect.evaluate(state),
                None => vec!["no state observed to check".to_string()],
            };
            if !misses.is_empty() {
                passed = false;
                message = Some(misses.join("; "));
            }
        }

        StepOutcome {
            index,
            action: step.action,
            passed,
            strategy: report.strategy,
            mutating_calls: report.mutating_calls,
            error_kind: None,
            message,
        }
    }

    fn judge_failure(index: usize, step: &Step, error: &EngineError) -> StepOutcome {
        let kind = error.kind_name();
        let expected = step.expect_error.as_deref() == Some(kind);
        StepOutcome {
            index,
            action: step.action,
            passed: expected,
            strategy: None,
            mutating_calls: 0,
            error_kind: Some(kind.to_string()),
            message: if expected { None } else { Some(error.to_string()) },
        }
    }

    fn execute_step<D: Driver>(
        step: &Step,
        engine: &mut Engine<D>,
        ctx: &mut ElementContext,
    ) -> Result<StepReport, EngineError> {
        match step.action {
            StepVerb::Navigate => {
                let url = step.value.as_deref().or(step.identifier.as_deref()).unwrap_or_default();
                engine.navigate(url)?;
                Ok(StepReport::empty())
            }
            StepVerb::Reload => {
                engine.reload()?;
                Ok(StepReport::empty())
            }
            StepVerb::Identify => {
                let request = step.request();
                let key = step
                    .context_key
                    .clone()
                    .unwrap_or_else(|| request.raw_identifier.clone());
                let options = ResolveOptions {
                    include_hidden: step.include_hidden,
                };
                let resolution = engine.identify(&request, &key, ctx, &options)?;
                let kind = resolution
                    .candidate
                    .kind
                    .clone()
                    .unwrap_or_else(|| request.component_kind.clone());
                Ok(StepReport {
                    strategy: Some(resolution.strategy),
                    trace: Some(resolution.trace.to_string()),
                    mutating_calls: 0,
                    state: Some(engine.describe(&resolution.candidate, &kind)),
                    misses: Vec::new(),
                })
            }
            StepVerb::SelectMany => {
                let options = ActOptions {
                    include_hidden: step.include_hidden,
                    context_key: step.context_key.clone(),
                    ..ActOptions::default()
                };
                let results = engine.select_many(&step.request(), &step.values, &options, ctx)?;
                let mut report = StepReport::empty();
                report.mutating_calls = results.iter().map(|r| r.mutating_calls).sum();
                if let Some(last) = results.last() {
                    report.strategy = Some(last.strategy);
                    report.trace = Some(last.trace.to_string());
                    report.state = Some(last.state().clone());
                }
                Ok(report)
            }
            StepVerb::ReadCell => {
                let column = step.column.as_deref().unwrap_or_default();
                let text = engine.read_cell(&step.request(), step.row.unwrap_or(0), column)?;
                let mut report = StepReport::empty();
                if let Some(want) = &step.value {
                    if normalize_text(want) != text {
                        report.misses.push(format!("cell: expected {want:?}, got {text:?}"));
                    }
                }
                Ok(report)
            }
            StepVerb::FindRow => {
                let column = step.column.as_deref().unwrap_or_default();
                let value = step.value.as_deref().unwrap_or_default();
                let row = engine.find_row(&step.request(), column, value)?;
                let mut report = StepReport::empty();
                if let Some(want) = step.row {
                    if want != row {
                        report.misses.push(format!("row: expected {want}, got {row}"));
                    }
                }
                Ok(report)
            }
            verb => {
                // Every remaining verb maps onto an action.
                let Some(action) = verb.action_kind() else {
                    return Ok(StepReport::empty());
                };
                let options = ActOptions {
                    include_hidden: step.include_hidden,
                    context_key: step.context_key.clone(),
                    ..ActOptions::default()
                };
                let value = step.value.as_deref();
                let result = match &step.use_context {
                    Some(key) => engine.act_in_context(key, action, value, &options, ctx)?,
                    None => engine.act(&step.request(), action, value, &options, ctx)?,
                };
                Ok(StepReport {
                    strategy: Some(result.strategy),
                    trace: Some(result.trace.to_string()),
                    mutating_calls: result.mutating_calls,
                    state: Some(result.state().clone()),
                    misses: Vec::new(),
                })
            }
        }
    }
}
