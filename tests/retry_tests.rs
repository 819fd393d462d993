use std::time::{Duration, Instant};

use locatorless::action::retry::{Attempt, DelayPolicy, Retry, RetryError, with_retry};

#[test]
fn succeeds_on_a_later_attempt() {
    let result: Result<(&str, u32), RetryError<&str>> =
        with_retry(3, DelayPolicy::none(), |attempt| {
            if attempt < 3 {
                Attempt::Retry("not yet")
            } else {
                Attempt::Ready("done")
            }
        });

    assert_eq!(result, Ok(("done", 3)));
}

#[test]
fn exhausted_budget_keeps_the_last_error() {
    let mut calls = 0;
    let result: Result<((), u32), RetryError<u32>> = with_retry(4, DelayPolicy::none(), |attempt| {
        calls += 1;
        Attempt::Retry(attempt)
    });

    match result {
        Err(RetryError::Exhausted { last, attempts, .. }) => {
            assert_eq!(last, 4);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(calls, 4);
}

#[test]
fn abort_stops_immediately() {
    let mut calls = 0;
    let result: Result<((), u32), RetryError<&str>> = with_retry(5, DelayPolicy::none(), |_| {
        calls += 1;
        Attempt::Abort("permanent")
    });

    assert_eq!(
        result,
        Err(RetryError::Aborted {
            error: "permanent",
            attempts: 1
        })
    );
    assert_eq!(calls, 1);
}

#[test]
fn zero_attempts_still_runs_once() {
    let mut calls = 0;
    let _: Result<((), u32), RetryError<()>> = with_retry(0, DelayPolicy::none(), |_| {
        calls += 1;
        Attempt::Retry(())
    });
    assert_eq!(calls, 1);
}

#[test]
fn polling_stops_at_the_deadline() {
    let start = Instant::now();
    let result: Result<((), u32), RetryError<()>> =
        Retry::polling(Duration::from_millis(40), Duration::from_millis(5)).run(|_| Attempt::Retry(()));

    let elapsed = start.elapsed();
    match result {
        Err(RetryError::Exhausted { attempts, elapsed: waited, .. }) => {
            assert!(attempts > 1);
            assert!(waited >= Duration::from_millis(40));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn zero_timeout_polls_exactly_once() {
    let mut calls = 0;
    let _: Result<((), u32), RetryError<()>> =
        Retry::polling(Duration::ZERO, Duration::from_millis(5)).run(|_| {
            calls += 1;
            Attempt::Retry(())
        });
    assert_eq!(calls, 1);
}

#[test]
fn backoff_grows_and_caps() {
    let policy = DelayPolicy::Backoff {
        initial_ms: 100,
        factor: 2,
        max_ms: 500,
    };

    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    assert_eq!(policy.delay_for(4), Duration::from_millis(500));
    assert_eq!(policy.delay_for(60), Duration::from_millis(500), "overflow caps too");
}

#[test]
fn delay_policy_reads_from_yaml() {
    let fixed: DelayPolicy = serde_yaml::from_str("kind: fixed\ndelay_ms: 250\n").expect("fixed");
    assert_eq!(fixed.delay_for(7), Duration::from_millis(250));

    let backoff: DelayPolicy =
        serde_yaml::from_str("kind: backoff\ninitial_ms: 10\nfactor: 3\nmax_ms: 1000\n").expect("backoff");
    assert_eq!(backoff.delay_for(3), Duration::from_millis(90));
}
