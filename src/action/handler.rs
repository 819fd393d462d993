use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::action::action_model::{ActionKind, ActionResult, Expectation};
use crate::action::config::{ActOptions, EngineConfig};
use crate::action::retry::{Attempt, Retry, RetryError};
use crate::browser::driver::Driver;
use crate::component::identifier::{self, Blocker, StateDescriptor};
use crate::component::kind::{Interaction, ToggleModel};
use crate::component::registry::KindRegistry;
use crate::context::element_context::{ContextEntry, ContextLookup, ElementContext};
use crate::error::{Diagnostic, DriverError, EngineError};
use crate::locate::locator::{ElementLocator, Resolution, ResolveOptions};
use crate::locate::request::IdentificationRequest;
use crate::locate::strategy::{ResolutionTrace, Strategy};
use crate::page::element::{Candidate, ElementHandle};
use crate::page::normalize::normalize_text;
use crate::page::pattern_index::{Generation, IndexCache, PatternIndex};
use crate::report::summary::IndexSummary;

/// Why a polled observation was not good enough yet.
#[derive(Debug)]
enum Miss {
    Blocked(Blocker),
    Mismatch(StateDescriptor),
    Absent,
    Driver(DriverError),
}

/// Mutating driver calls issued for one action.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    calls: u32,
    attempts: u32,
}

// ============================================================================
// Engine
// ============================================================================

/// Resolution and interaction engine bound to one driver session.
///
/// Owns the pattern-index cache and the DOM generation counter of that
/// session. The Element Context is owned by the caller and passed in.
pub struct Engine<D: Driver> {
    driver: D,
    registry: KindRegistry,
    config: EngineConfig,
    cache: IndexCache,
    generation: Generation,
    last_url: Option<String>,
}

impl<D: Driver> Engine<D> {
    pub fn new(driver: D, registry: KindRegistry, config: EngineConfig) -> Self {
        Engine {
            driver,
            registry,
            config,
            cache: IndexCache::new(),
            generation: 0,
            last_url: None,
        }
    }

    /// Engine with every built-in kind and default timings.
    pub fn with_defaults(driver: D) -> Self {
        Self::new(driver, KindRegistry::builtin(), EngineConfig::default())
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Page traversals performed so far.
    pub fn traversals(&self) -> usize {
        self.cache.traversals()
    }

    // ------------------------------------------------------------------
    // Page lifecycle
    // ------------------------------------------------------------------

    pub fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.driver.navigate(url)?;
        self.last_url = Some(self.driver.current_url().unwrap_or_else(|_| url.to_string()));
        self.advance_generation("navigate");
        Ok(())
    }

    pub fn reload(&mut self) -> Result<(), EngineError> {
        let url = self.driver.current_url()?;
        self.driver.navigate(&url)?;
        self.last_url = Some(url);
        self.advance_generation("reload");
        Ok(())
    }

    /// Record a navigation the engine did not issue itself.
    pub fn notify_navigation(&mut self) {
        self.advance_generation("external");
    }

    fn advance_generation(&mut self, cause: &str) {
        self.generation += 1;
        self.cache.invalidate();
        info!(generation = self.generation, cause, "DOM generation advanced");
    }

    /// A mutating call may have followed a link.
    fn sync_navigation(&mut self) {
        match self.driver.current_url() {
            Ok(url) => {
                let moved = self.last_url.as_deref().is_some_and(|last| last != url);
                self.last_url = Some(url);
                if moved {
                    self.advance_generation("url changed");
                }
            }
            Err(e) => debug!(error = %e, "current url unavailable"),
        }
    }

    // ------------------------------------------------------------------
    // Discover / describe / resolve
    // ------------------------------------------------------------------

    /// Pattern index of the current generation, optionally restricted to
    /// one kind. Cached until the generation changes.
    pub fn discover(&mut self, kind: Option<&str>) -> Arc<PatternIndex> {
        self.cache
            .discover(&mut self.driver, &self.registry, self.generation, kind)
    }

    /// Counts by kind and state over the current index.
    pub fn summarize(&mut self, kind: Option<&str>) -> IndexSummary {
        let index = self.discover(kind);
        IndexSummary::build(&index, &self.registry)
    }

    /// Discovery-time state of every `kind` element in the group or
    /// container named `group`, in document order.
    pub fn group_members(&mut self, kind: &str, group: &str) -> Vec<StateDescriptor> {
        let index = self.discover(None);
        index
            .of_kind(kind)
            .filter(|c| c.in_group(group))
            .map(|c| identifier::describe(c, c.kind.as_deref().unwrap_or(kind), &self.registry))
            .collect()
    }

    /// State of a candidate as captured at discovery.
    pub fn describe(&self, candidate: &Candidate, kind: &str) -> StateDescriptor {
        identifier::describe(candidate, kind, &self.registry)
    }

    /// State of a candidate read from the live page.
    pub fn describe_live(&mut self, candidate: &Candidate, kind: &str) -> Result<StateDescriptor, EngineError> {
        Ok(identifier::describe_live(
            &mut self.driver,
            candidate,
            kind,
            &self.registry,
        )?)
    }

    pub fn resolve(
        &mut self,
        request: &IdentificationRequest,
        options: &ResolveOptions,
    ) -> Result<Resolution, EngineError> {
        let index = self.discover(None);
        ElementLocator::new(&self.registry).resolve(&index, request, options)
    }

    /// Resolve `request` and store the result in `ctx` under `key`.
    pub fn identify(
        &mut self,
        request: &IdentificationRequest,
        key: &str,
        ctx: &mut ElementContext,
        options: &ResolveOptions,
    ) -> Result<Resolution, EngineError> {
        let resolution = self.resolve(request, options)?;
        let kind = kind_of(&resolution.candidate, request);
        ctx.put(key, resolution.candidate.clone(), kind, resolution.generation)
            .request = Some(request.clone());
        info!(key, request = %request, strategy = %resolution.strategy, "identified");
        Ok(resolution)
    }

    /// Drop the cached index so the next lookup re-reads the page, then
    /// resolve again. Used after an element was re-rendered in place.
    fn relocate(&mut self, request: &IdentificationRequest) -> Option<Candidate> {
        self.cache.invalidate();
        match self.resolve(request, &ResolveOptions::default()) {
            Ok(resolution) => {
                debug!(handle = %resolution.candidate.handle(), "element relocated");
                Some(resolution.candidate)
            }
            Err(e) => {
                debug!(error = %e, "element could not be relocated");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Act
    // ------------------------------------------------------------------

    /// Resolve `request` and perform `action` on it.
    ///
    /// Sequence: resolution, idempotence check, precondition wait,
    /// interaction with retry, navigation check, verification, and the
    /// optional store into `ctx`.
    pub fn act(
        &mut self,
        request: &IdentificationRequest,
        action: ActionKind,
        value: Option<&str>,
        options: &ActOptions,
        ctx: &mut ElementContext,
    ) -> Result<ActionResult, EngineError> {
        let resolve_options = ResolveOptions {
            include_hidden: options.include_hidden,
        };
        let resolution = self.resolve(request, &resolve_options)?;
        self.perform(request, resolution, action, value, options, ctx)
    }

    /// Select each of `values` in a multiple-choice dropdown, one entry at
    /// a time. Entries already selected cost no driver call. Stops at the
    /// first entry that fails.
    pub fn select_many(
        &mut self,
        request: &IdentificationRequest,
        values: &[String],
        options: &ActOptions,
        ctx: &mut ElementContext,
    ) -> Result<Vec<ActionResult>, EngineError> {
        let resolve_options = ResolveOptions {
            include_hidden: options.include_hidden,
        };
        let resolution = self.resolve(request, &resolve_options)?;
        let kind = kind_of(&resolution.candidate, request);
        let state = self.describe(&resolution.candidate, &kind);

        let reason = if values.is_empty() {
            Some("no values given".to_string())
        } else if values.len() > 1 && state.state.multiple != Some(true) {
            Some(format!("'{kind}' takes a single choice"))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(EngineError::Unsupported {
                diagnostic: Diagnostic::new(request.clone(), resolution.trace),
                action: "select_many".to_string(),
                reason,
            });
        }

        values
            .iter()
            .map(|value| self.act(request, ActionKind::Select, Some(value.as_str()), options, ctx))
            .collect()
    }

    /// Perform `action` on the element stored in `ctx` under `key`.
    ///
    /// A stale entry is never acted on: it is resolved again from the
    /// request that produced it and the entry is replaced.
    pub fn act_in_context(
        &mut self,
        key: &str,
        action: ActionKind,
        value: Option<&str>,
        options: &ActOptions,
        ctx: &mut ElementContext,
    ) -> Result<ActionResult, EngineError> {
        let (request, resolution) = match ctx.get(key, self.generation) {
            ContextLookup::Fresh(entry) => {
                let mut trace = ResolutionTrace::new();
                trace.record(Strategy::Context, 1);
                let resolution = Resolution {
                    candidate: entry.candidate.clone(),
                    strategy: Strategy::Context,
                    trace,
                    generation: entry.resolved_generation,
                };
                (request_of(entry), resolution)
            }
            ContextLookup::Stale(entry) => {
                debug!(
                    key,
                    resolved = entry.resolved_generation,
                    current = self.generation,
                    "context entry stale, resolving again"
                );
                let request = request_of(entry);
                let mut trace = ResolutionTrace::new();
                trace.note(
                    Strategy::Context,
                    1,
                    format!("stale since generation {}", entry.resolved_generation),
                );
                let resolve_options = ResolveOptions {
                    include_hidden: options.include_hidden,
                };
                let mut resolution = self.resolve(&request, &resolve_options)?;
                trace.extend(&resolution.trace);
                resolution.trace = trace;
                (request, resolution)
            }
            ContextLookup::Absent => {
                let mut trace = ResolutionTrace::new();
                trace.note(Strategy::Context, 0, "no entry under this key");
                return Err(EngineError::NotFound {
                    diagnostic: Diagnostic::new(IdentificationRequest::auto(key, "any"), trace),
                });
            }
        };

        let mut options = options.clone();
        if options.context_key.is_none() {
            options.context_key = Some(key.to_string());
        }
        self.perform(&request, resolution, action, value, &options, ctx)
    }

    fn perform(
        &mut self,
        request: &IdentificationRequest,
        resolution: Resolution,
        action: ActionKind,
        value: Option<&str>,
        options: &ActOptions,
        ctx: &mut ElementContext,
    ) -> Result<ActionResult, EngineError> {
        let Resolution {
            mut candidate,
            strategy,
            trace,
            ..
        } = resolution;
        let kind = kind_of(&candidate, request);
        let diagnostic = Diagnostic::new(request.clone(), trace.clone());
        let start_generation = self.generation;

        self.check_supported(&diagnostic, &kind, action, value)?;

        if action == ActionKind::Query {
            let state = identifier::describe_live(&mut self.driver, &candidate, &kind, &self.registry)
                .map_err(|e| EngineError::driver_failed(&diagnostic, "reading element state", e))?;
            self.remember(ctx, options, request, &candidate, &kind, start_generation);
            return Ok(ActionResult {
                request: request.clone(),
                action,
                handle: candidate.handle().clone(),
                strategy,
                trace,
                before: state.clone(),
                after: Some(state),
                mutating_calls: 0,
                attempts: 0,
                already_satisfied: false,
                generation: self.generation,
            });
        }

        // Already at the target: success without touching the page, whatever
        // the precondition would say.
        let idempotent = action.binary_target().is_some()
            || matches!(action, ActionKind::Select | ActionKind::GoToPage);
        if idempotent {
            match identifier::describe_live(&mut self.driver, &candidate, &kind, &self.registry) {
                Ok(current) if current.attached && target_reached(action, &current, value) => {
                    info!(action = %action, request = %request, "already in target state");
                    self.remember(ctx, options, request, &candidate, &kind, start_generation);
                    return Ok(self.satisfied(request, action, &candidate, strategy, trace, current));
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    debug!(action = %action, error = %e, "state read failed, waiting for the element");
                }
                Err(e) => return Err(EngineError::driver_failed(&diagnostic, "reading element state", e)),
            }
        }

        let timeout = Duration::from_millis(
            options
                .timeout_ms
                .unwrap_or(self.config.precondition_timeout_ms),
        );
        let before = self.await_interactable(
            &diagnostic,
            request,
            &mut candidate,
            &kind,
            options.include_hidden,
            timeout,
        )?;

        // The target may have been reached while waiting.
        if idempotent && target_reached(action, &before, value) {
            info!(action = %action, request = %request, "already in target state");
            self.remember(ctx, options, request, &candidate, &kind, start_generation);
            return Ok(self.satisfied(request, action, &candidate, strategy, trace, before));
        }
        let expectation = Expectation::for_action(action, &before, value);

        let mut tally = Tally::default();
        let text = value.unwrap_or_default();
        match action {
            ActionKind::Click
            | ActionKind::Toggle
            | ActionKind::TurnOn
            | ActionKind::TurnOff
            | ActionKind::Check
            | ActionKind::Uncheck => {
                self.interact(&diagnostic, request, action, &mut candidate, &mut tally, |d, h| d.click(h))?;
            }
            ActionKind::SetValue | ActionKind::Upload => {
                self.interact(&diagnostic, request, action, &mut candidate, &mut tally, |d, h| {
                    d.set_value(h, text)
                })?;
            }
            ActionKind::Clear => {
                self.interact(&diagnostic, request, action, &mut candidate, &mut tally, |d, h| {
                    d.set_value(h, "")
                })?;
            }
            ActionKind::Select | ActionKind::GoToPage => {
                self.pick_child(&diagnostic, request, action, &mut candidate, &kind, &before, text, &mut tally)?;
            }
            ActionKind::DragTo => {
                let target = self.resolve(&IdentificationRequest::auto(text, "any"), &ResolveOptions::default())?;
                let to = target.candidate.handle().clone();
                self.interact(&diagnostic, request, action, &mut candidate, &mut tally, |d, h| d.drag(h, &to))?;
            }
            ActionKind::Query => {}
        }

        self.sync_navigation();

        let after = if self.generation != start_generation {
            debug!(action = %action, "page navigated, post-state not observable");
            None
        } else if !options.verify {
            None
        } else if let Some(expected) = &expectation {
            Some(self.verify(&diagnostic, action, &candidate, &kind, expected)?)
        } else {
            identifier::describe_live(&mut self.driver, &candidate, &kind, &self.registry).ok()
        };

        info!(
            action = %action,
            request = %request,
            strategy = %strategy,
            calls = tally.calls,
            "action completed"
        );
        self.remember(ctx, options, request, &candidate, &kind, start_generation);

        Ok(ActionResult {
            request: request.clone(),
            action,
            handle: candidate.handle().clone(),
            strategy,
            trace,
            before,
            after,
            mutating_calls: tally.calls,
            attempts: tally.attempts,
            already_satisfied: false,
            generation: self.generation,
        })
    }

    fn satisfied(
        &self,
        request: &IdentificationRequest,
        action: ActionKind,
        candidate: &Candidate,
        strategy: Strategy,
        trace: ResolutionTrace,
        state: StateDescriptor,
    ) -> ActionResult {
        ActionResult {
            request: request.clone(),
            action,
            handle: candidate.handle().clone(),
            strategy,
            trace,
            after: Some(state.clone()),
            before: state,
            mutating_calls: 0,
            attempts: 0,
            already_satisfied: true,
            generation: self.generation,
        }
    }

    fn check_supported(
        &self,
        diagnostic: &Diagnostic,
        kind: &str,
        action: ActionKind,
        value: Option<&str>,
    ) -> Result<(), EngineError> {
        let unsupported = |reason: String| EngineError::Unsupported {
            diagnostic: diagnostic.clone(),
            action: action.to_string(),
            reason,
        };

        if action.requires_value() && value.is_none() {
            return Err(unsupported(format!("{action} needs a value")));
        }
        if action == ActionKind::GoToPage
            && !value.is_some_and(|v| v.trim().parse::<u32>().is_ok_and(|n| n >= 1))
        {
            return Err(unsupported("page must be a positive integer".to_string()));
        }

        let interaction = self
            .registry
            .get(kind)
            .map(|d| d.interaction)
            .unwrap_or(Interaction::CLICK_ONLY);

        let supported = match action {
            ActionKind::Click | ActionKind::Query | ActionKind::DragTo => true,
            ActionKind::SetValue | ActionKind::Clear => interaction.text_entry,
            ActionKind::Toggle | ActionKind::TurnOff | ActionKind::Uncheck => {
                interaction.toggle == ToggleModel::Binary
            }
            ActionKind::TurnOn | ActionKind::Check => interaction.toggle != ToggleModel::None,
            ActionKind::Select => interaction.selectable,
            ActionKind::GoToPage => interaction.paged,
            ActionKind::Upload => interaction.upload,
        };

        if supported {
            Ok(())
        } else {
            Err(unsupported(format!("'{kind}' elements do not support it")))
        }
    }

    /// Poll until the element is attached, visible, enabled and idle.
    fn await_interactable(
        &mut self,
        diagnostic: &Diagnostic,
        request: &IdentificationRequest,
        candidate: &mut Candidate,
        kind: &str,
        include_hidden: bool,
        timeout: Duration,
    ) -> Result<StateDescriptor, EngineError> {
        let retry = Retry::polling(timeout, self.config.poll_interval());
        let outcome = retry.run(|_| {
            let state = match identifier::describe_live(&mut self.driver, candidate, kind, &self.registry) {
                Ok(state) => state,
                Err(e) if e.is_transient() => return Attempt::Retry(Miss::Driver(e)),
                Err(e) => return Attempt::Abort(Miss::Driver(e)),
            };
            match state.blocker() {
                None => Attempt::Ready(state),
                Some(Blocker::Hidden) if include_hidden => Attempt::Ready(state),
                Some(Blocker::Detached) => {
                    if let Some(fresh) = self.relocate(request) {
                        *candidate = fresh;
                    }
                    Attempt::Retry(Miss::Blocked(Blocker::Detached))
                }
                Some(blocker) => Attempt::Retry(Miss::Blocked(blocker)),
            }
        });

        match outcome {
            Ok((state, _)) => Ok(state),
            Err(RetryError::Exhausted { last, elapsed, .. }) => {
                let waited_ms = elapsed.as_millis() as u64;
                Err(match last {
                    Miss::Blocked(Blocker::Loading) => EngineError::TimedOut {
                        diagnostic: diagnostic.clone(),
                        waited_ms,
                        waiting_for: "element to finish loading".to_string(),
                    },
                    Miss::Blocked(blocker) => EngineError::NotInteractable {
                        diagnostic: diagnostic.clone(),
                        blocker,
                    },
                    Miss::Driver(e) => EngineError::driver_failed(diagnostic, "reading element state", e),
                    Miss::Mismatch(_) | Miss::Absent => EngineError::TimedOut {
                        diagnostic: diagnostic.clone(),
                        waited_ms,
                        waiting_for: "element to become interactable".to_string(),
                    },
                })
            }
            Err(RetryError::Aborted { error, .. }) => Err(match error {
                Miss::Driver(e) => EngineError::driver_failed(diagnostic, "reading element state", e),
                Miss::Blocked(blocker) => EngineError::NotInteractable {
                    diagnostic: diagnostic.clone(),
                    blocker,
                },
                Miss::Mismatch(_) | Miss::Absent => EngineError::NotFound {
                    diagnostic: diagnostic.clone(),
                },
            }),
        }
    }

    /// One mutating driver call, retried on transient failures.
    fn interact<F>(
        &mut self,
        diagnostic: &Diagnostic,
        request: &IdentificationRequest,
        action: ActionKind,
        candidate: &mut Candidate,
        tally: &mut Tally,
        mut call: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(&mut D, &ElementHandle) -> Result<(), DriverError>,
    {
        let retry = Retry::new(self.config.retry_attempts, self.config.retry_delay);
        let outcome = retry.run(|attempt| {
            tally.calls += 1;
            match call(&mut self.driver, candidate.handle()) {
                Ok(()) => Attempt::Ready(()),
                Err(e) if e.is_transient() => {
                    warn!(action = %action, attempt, error = %e, "transient driver failure");
                    if matches!(e, DriverError::StaleElement(_)) {
                        if let Some(fresh) = self.relocate(request) {
                            *candidate = fresh;
                        }
                    }
                    Attempt::Retry(e)
                }
                Err(e) => Attempt::Abort(e),
            }
        });

        match outcome {
            Ok(((), attempts)) => {
                tally.attempts = attempts;
                Ok(())
            }
            Err(RetryError::Exhausted { last, attempts, .. })
            | Err(RetryError::Aborted {
                error: last,
                attempts,
            }) => {
                tally.attempts = attempts;
                Err(EngineError::ActionFailed {
                    diagnostic: diagnostic.clone(),
                    action: action.to_string(),
                    attempts,
                    source: last,
                })
            }
        }
    }

    /// Open the container if needed, find the popup entry labelled `label`
    /// and click it.
    #[allow(clippy::too_many_arguments)]
    fn pick_child(
        &mut self,
        diagnostic: &Diagnostic,
        request: &IdentificationRequest,
        action: ActionKind,
        container: &mut Candidate,
        kind: &str,
        before: &StateDescriptor,
        label: &str,
        tally: &mut Tally,
    ) -> Result<(), EngineError> {
        let Some(child_kind) = self.registry.get(kind).and_then(|d| d.child_kind) else {
            return Err(EngineError::Unsupported {
                diagnostic: diagnostic.clone(),
                action: action.to_string(),
                reason: format!("'{kind}' has no child entries"),
            });
        };

        // Page items are always rendered; selectors render options on open.
        let paged = action == ActionKind::GoToPage;
        if !paged && before.state.expanded != Some(true) {
            self.interact(diagnostic, request, action, container, tally, |d, h| d.click(h))?;
        }

        let wanted = normalize_text(label);
        let span = if paged {
            // Page items sit between this container and the next one.
            let index = self.discover(None);
            let next = index
                .of_kind(kind)
                .map(|c| c.order)
                .find(|&order| order > container.order);
            Some((container.order, next))
        } else {
            None
        };
        let generation = self.generation;
        let retry = Retry::polling(self.config.verify_settle(), self.config.poll_interval());
        let outcome = retry.run(|_| match self.driver.snapshot() {
            Ok(elements) => {
                let popup = PatternIndex::build(generation, elements, &self.registry, Some(child_kind));
                match find_child(&popup, &wanted, span, paged) {
                    Some(found) => Attempt::Ready(found.clone()),
                    None => Attempt::Retry(Miss::Absent),
                }
            }
            Err(e) if e.is_transient() => Attempt::Retry(Miss::Driver(e)),
            Err(e) => Attempt::Abort(Miss::Driver(e)),
        });

        let mut child = match outcome {
            Ok((found, _)) => found,
            Err(RetryError::Aborted {
                error: Miss::Driver(e),
                ..
            }) => return Err(EngineError::driver_failed(diagnostic, "reading popup entries", e)),
            Err(_) => {
                let mut trace = diagnostic.trace.clone();
                trace.note(
                    Strategy::ExactLabel,
                    0,
                    format!("no visible {child_kind} labelled '{wanted}'"),
                );
                return Err(EngineError::NotFound {
                    diagnostic: Diagnostic::new(request.clone(), trace),
                });
            }
        };

        debug!(child_kind, label = %wanted, handle = %child.handle(), "popup entry found");
        let child_request = IdentificationRequest::label(wanted, child_kind);
        self.interact(diagnostic, &child_request, action, &mut child, tally, |d, h| d.click(h))
    }

    /// Poll the live state until `expected` holds or the settle window ends.
    fn verify(
        &mut self,
        diagnostic: &Diagnostic,
        action: ActionKind,
        candidate: &Candidate,
        kind: &str,
        expected: &Expectation,
    ) -> Result<StateDescriptor, EngineError> {
        let retry = Retry::polling(self.config.verify_settle(), self.config.poll_interval());
        let outcome = retry.run(|_| {
            match identifier::describe_live(&mut self.driver, candidate, kind, &self.registry) {
                Ok(state) if expected.is_met(&state) => Attempt::Ready(state),
                Ok(state) => Attempt::Retry(Miss::Mismatch(state)),
                Err(e) if e.is_transient() => Attempt::Retry(Miss::Driver(e)),
                Err(e) => Attempt::Abort(Miss::Driver(e)),
            }
        });

        match outcome {
            Ok((state, _)) => Ok(state),
            Err(RetryError::Exhausted {
                last: Miss::Mismatch(state),
                ..
            }) => {
                warn!(action = %action, expected = %expected, "post-state mismatch");
                Err(EngineError::VerificationFailed {
                    diagnostic: diagnostic.clone(),
                    action: action.to_string(),
                    expected: expected.to_string(),
                    observed: expected.observed(&state),
                })
            }
            Err(RetryError::Exhausted { last, .. }) | Err(RetryError::Aborted { error: last, .. }) => {
                Err(match last {
                    Miss::Driver(e) => EngineError::driver_failed(diagnostic, "verifying the post-state", e),
                    _ => EngineError::VerificationFailed {
                        diagnostic: diagnostic.clone(),
                        action: action.to_string(),
                        expected: expected.to_string(),
                        observed: "nothing observable".to_string(),
                    },
                })
            }
        }
    }

    fn remember(
        &self,
        ctx: &mut ElementContext,
        options: &ActOptions,
        request: &IdentificationRequest,
        candidate: &Candidate,
        kind: &str,
        generation: Generation,
    ) {
        if let Some(key) = &options.context_key {
            ctx.put(key.clone(), candidate.clone(), kind, generation).request = Some(request.clone());
        }
    }
}

/// The classified kind of a candidate, falling back to the requested one.
fn kind_of(candidate: &Candidate, request: &IdentificationRequest) -> String {
    candidate
        .kind
        .clone()
        .unwrap_or_else(|| request.component_kind.clone())
}

fn target_reached(action: ActionKind, state: &StateDescriptor, value: Option<&str>) -> bool {
    Expectation::for_action(action, state, value).is_some_and(|e| e.is_met(state))
}

fn request_of(entry: &ContextEntry) -> IdentificationRequest {
    entry
        .request
        .clone()
        .unwrap_or_else(|| IdentificationRequest::auto(entry.key.clone(), entry.component_kind.clone()))
}

/// Rendered popup entry labelled `wanted`: exact label first, then the
/// shortest label containing it unless `exact_only`. A `span` of
/// `(after, before)` document orders keeps only the entries in between.
fn find_child<'a>(
    popup: &'a PatternIndex,
    wanted: &str,
    span: Option<(usize, Option<usize>)>,
    exact_only: bool,
) -> Option<&'a Candidate> {
    let within = |order: usize| {
        span.is_none_or(|(after, before)| order > after && before.is_none_or(|b| order < b))
    };
    let pool: Vec<&Candidate> = popup
        .candidates()
        .iter()
        .filter(|c| c.is_rendered() && within(c.order))
        .collect();

    if let Some(exact) = pool.iter().find(|c| c.label == wanted).copied() {
        return Some(exact);
    }
    if exact_only {
        return None;
    }
    let needle = wanted.to_lowercase();
    pool.into_iter()
        .filter(|c| c.label.to_lowercase().contains(&needle))
        .min_by_key(|c| (c.label.chars().count(), c.order))
}
