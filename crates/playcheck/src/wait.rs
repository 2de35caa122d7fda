//! Wait mechanisms: the polling loop behind auto-waiting locators,
//! retrying assertions and page load states.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::result::{PlaycheckError, PlaycheckResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Network idle threshold (500ms without finished requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// Whether a `document.readyState` value satisfies this state
    #[must_use]
    pub fn is_reached_by(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load | Self::NetworkIdle => ready_state == "complete",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for a polling wait
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Human-readable description of the awaited condition
    pub description: String,
}

impl WaitOptions {
    /// Create wait options for a described condition
    #[must_use]
    pub fn new(description: impl Into<String>, timeout: Duration) -> Self {
        Self {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            description: description.into(),
        }
    }

    /// Set polling interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of one probe inside [`poll_until`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// Condition met
    Done(T),
    /// Not yet; carries what was seen instead
    Retry(String),
}

/// Re-run `probe` until it reports [`Observation::Done`] or the timeout elapses.
///
/// Transient errors (missing elements, actionability, failed evaluations
/// during navigation) count as another retry; other errors abort the wait.
/// The probe always runs at least once, even with a zero timeout.
///
/// # Errors
///
/// Returns `Timeout` carrying the last observation, or the first
/// non-transient error raised by the probe.
pub async fn poll_until<T, F, Fut>(options: &WaitOptions, mut probe: F) -> PlaycheckResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PlaycheckResult<Observation<T>>>,
{
    let start = Instant::now();
    let mut last = String::from("no observation");
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match probe().await {
            Ok(Observation::Done(value)) => return Ok(value),
            Ok(Observation::Retry(seen)) => last = seen,
            Err(err) if err.is_transient() => last = err.to_string(),
            Err(err) => return Err(err),
        }

        let elapsed = start.elapsed();
        if elapsed >= options.timeout() {
            trace!(attempts, waiting_for = %options.description, "wait timed out");
            return Err(PlaycheckError::Timeout {
                ms: options.timeout_ms,
                waiting_for: format!("{} (last: {last})", options.description),
            });
        }
        let remaining = options.timeout().saturating_sub(elapsed);
        tokio::time::sleep(options.poll_interval().min(remaining)).await;
    }
}

/// Wait until a synchronous predicate holds
///
/// # Errors
///
/// Returns `Timeout` if the predicate never holds
pub async fn wait_until<F>(predicate: F, options: &WaitOptions) -> PlaycheckResult<()>
where
    F: Fn() -> bool,
{
    poll_until(options, || {
        let ok = predicate();
        async move {
            Ok(if ok {
                Observation::Done(())
            } else {
                Observation::Retry("predicate false".to_string())
            })
        }
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_event_names() {
            assert_eq!(LoadState::Load.to_string(), "load");
            assert_eq!(LoadState::DomContentLoaded.event_name(), "DOMContentLoaded");
            assert_eq!(LoadState::default(), LoadState::Load);
        }

        #[test]
        fn test_ready_state_mapping() {
            assert!(LoadState::DomContentLoaded.is_reached_by("interactive"));
            assert!(!LoadState::Load.is_reached_by("interactive"));
            assert!(LoadState::Load.is_reached_by("complete"));
            assert!(!LoadState::NetworkIdle.is_reached_by("loading"));
        }
    }

    mod poll_tests {
        use super::*;

        fn opts(ms: u64) -> WaitOptions {
            WaitOptions::new("counter reaches 3", Duration::from_millis(ms))
                .with_poll_interval(Duration::from_millis(10))
        }

        #[tokio::test]
        async fn test_poll_until_succeeds_after_retries() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let value = poll_until(&opts(1000), move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Ok(if n >= 3 {
                        Observation::Done(n)
                    } else {
                        Observation::Retry(format!("counter = {n}"))
                    })
                }
            })
            .await
            .unwrap();
            assert_eq!(value, 3);
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_poll_until_times_out_with_last_observation() {
            let err = poll_until(&opts(50), || async {
                Ok::<_, PlaycheckError>(Observation::<()>::Retry("counter = 1".into()))
            })
            .await
            .unwrap_err();
            match err {
                PlaycheckError::Timeout { ms, waiting_for } => {
                    assert_eq!(ms, 50);
                    assert!(waiting_for.contains("counter reaches 3"));
                    assert!(waiting_for.contains("counter = 1"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_transient_errors_are_retried() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let value = poll_until(&opts(1000), move || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(PlaycheckError::ElementNotFound {
                            selector: "css=#x".into(),
                        })
                    } else {
                        Ok(Observation::Done("found"))
                    }
                }
            })
            .await
            .unwrap();
            assert_eq!(value, "found");
        }

        #[tokio::test]
        async fn test_fatal_errors_abort() {
            let err = poll_until(&opts(1000), || async {
                Err::<Observation<()>, _>(PlaycheckError::page("target closed"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, PlaycheckError::PageError { .. }));
        }

        #[tokio::test]
        async fn test_zero_timeout_probes_once() {
            let value = poll_until(&opts(0), || async { Ok(Observation::Done(7)) })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        #[tokio::test]
        async fn test_wait_until_predicate() {
            let flag = Arc::new(AtomicU32::new(0));
            let f = Arc::clone(&flag);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                f.store(1, Ordering::SeqCst);
            });
            wait_until(|| flag.load(Ordering::SeqCst) == 1, &opts(1000))
                .await
                .unwrap();
            handle.await.unwrap();
        }
    }
}
