use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delay between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayPolicy {
    Fixed {
        delay_ms: u64,
    },
    /// `initial_ms * factor^(attempt-1)`, capped at `max_ms`.
    Backoff {
        initial_ms: u64,
        factor: u32,
        max_ms: u64,
    },
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Fixed { delay_ms: 500 }
    }
}

impl DelayPolicy {
    pub fn none() -> Self {
        DelayPolicy::Fixed { delay_ms: 0 }
    }

    /// Delay to wait after the given 1-based attempt failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            DelayPolicy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            DelayPolicy::Backoff {
                initial_ms,
                factor,
                max_ms,
            } => {
                let exp = attempt.saturating_sub(1);
                let scaled = u64::from(factor)
                    .checked_pow(exp)
                    .and_then(|m| initial_ms.checked_mul(m))
                    .unwrap_or(max_ms);
                Duration::from_millis(scaled.min(max_ms))
            }
        }
    }
}

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Ready(T),
    /// Worth trying again.
    Retry(E),
    /// Permanent; stop immediately.
    Abort(E),
}

#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    /// The attempt budget or the deadline ran out.
    Exhausted {
        last: E,
        attempts: u32,
        elapsed: Duration,
    },
    Aborted {
        error: E,
        attempts: u32,
    },
}

/// Bounded retry: a maximum number of attempts, a deadline, or both.
///
/// The body always runs at least once. No delay follows the last attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retry {
    max_attempts: Option<u32>,
    deadline: Option<Duration>,
    delay: DelayPolicy,
}

impl Retry {
    /// Up to `attempts` tries with `delay` between them.
    pub fn new(attempts: u32, delay: DelayPolicy) -> Self {
        Retry {
            max_attempts: Some(attempts.max(1)),
            deadline: None,
            delay,
        }
    }

    /// Poll every `interval` until `timeout` has elapsed.
    pub fn polling(timeout: Duration, interval: Duration) -> Self {
        Retry {
            max_attempts: None,
            deadline: Some(timeout),
            delay: DelayPolicy::Fixed {
                delay_ms: interval.as_millis() as u64,
            },
        }
    }

    pub fn run<T, E, F>(&self, mut body: F) -> Result<(T, u32), RetryError<E>>
    where
        F: FnMut(u32) -> Attempt<T, E>,
    {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let last = match body(attempt) {
                Attempt::Ready(value) => return Ok((value, attempt)),
                Attempt::Abort(error) => {
                    return Err(RetryError::Aborted {
                        error,
                        attempts: attempt,
                    });
                }
                Attempt::Retry(error) => error,
            };

            let elapsed = start.elapsed();
            let out_of_attempts = self.max_attempts.is_some_and(|max| attempt >= max);
            let out_of_time = self.deadline.is_some_and(|d| elapsed >= d);
            if out_of_attempts || out_of_time {
                return Err(RetryError::Exhausted {
                    last,
                    attempts: attempt,
                    elapsed,
                });
            }

            let mut pause = self.delay.delay_for(attempt);
            if let Some(deadline) = self.deadline {
                pause = pause.min(deadline.saturating_sub(elapsed));
            }
            debug!(attempt, pause_ms = pause.as_millis() as u64, "retrying");
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }
}

/// Run `body` up to `attempts` times, pausing per `delay` between tries.
pub fn with_retry<T, E, F>(attempts: u32, delay: DelayPolicy, body: F) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut(u32) -> Attempt<T, E>,
{
    Retry::new(attempts, delay).run(body)
}
