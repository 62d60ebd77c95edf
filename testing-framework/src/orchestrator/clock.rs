// File: testing-framework/src/orchestrator/clock.rs
//
// Clock Abstraction
//
// The simulated chain derives block timestamps from an injected clock, and
// confirmation waits poll through it. Tests swap in PausedClock so that
// neither ever depends on wall-clock time.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::{self, Duration, Instant};

/// Why a `PausedClock` could not be created
#[derive(Debug, Error)]
pub enum ClockError {
    /// Called outside any tokio runtime
    #[error("PausedClock must be created inside a tokio runtime")]
    NoRuntime,

    /// tokio only pauses time on a current-thread runtime
    #[error("PausedClock requires a current_thread tokio runtime, found {0:?}")]
    UnsupportedRuntime(RuntimeFlavor),
}

/// Source of time for the simulated chain and the confirmation waiter
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokio::time::Duration;
/// use why_testing_framework::orchestrator::clock::{Clock, PausedClock};
///
/// #[tokio::test(start_paused = true)]
/// async fn test_block_spacing() {
///     let clock = Arc::new(PausedClock::new().unwrap());
///     let start = clock.now();
///     clock.advance(Duration::from_secs(12)).await;
///     assert_eq!(clock.now() - start, Duration::from_secs(12));
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Current instant (simulated under `PausedClock`)
    fn now(&self) -> Instant;

    /// Sleep for `d`; returns as soon as time is advanced under `PausedClock`
    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Real tokio time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

/// Paused tokio time
///
/// Time only moves through `advance()` or through tokio's auto-advance when
/// every task is idle inside a `sleep`. Requires a current-thread runtime,
/// which `#[tokio::test]` provides.
///
/// # Notes
///
/// 1. `#[tokio::test(start_paused = true)]` already pauses time
/// 2. `PausedClock::new()` pauses it otherwise; creating a second clock in
///    the same runtime is fine
#[derive(Debug, Clone, Copy)]
pub struct PausedClock;

impl PausedClock {
    /// Creates a PausedClock, pausing tokio time if it isn't already
    ///
    /// # Errors
    ///
    /// Fails outside a runtime and on a multi-thread runtime, where tokio
    /// cannot pause time.
    pub fn new() -> Result<Self, ClockError> {
        let handle = Handle::try_current().map_err(|_| ClockError::NoRuntime)?;
        let flavor = handle.runtime_flavor();
        if flavor != RuntimeFlavor::CurrentThread {
            return Err(ClockError::UnsupportedRuntime(flavor));
        }

        if !time_is_frozen() {
            time::pause();
        }
        Ok(Self)
    }

    /// Advance the simulated time by `d`, waking expired sleeps
    pub async fn advance(&self, d: Duration) {
        time::advance(d).await
    }
}

// A paused tokio clock stands still while the wall clock moves on
fn time_is_frozen() -> bool {
    let before = time::Instant::now();
    let wall = std::time::Instant::now();
    while std::time::Instant::now() == wall {
        std::hint::spin_loop();
    }
    time::Instant::now() == before
}

impl Clock for PausedClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_paused_clock_advancement() {
        let clock = Arc::new(PausedClock::new().unwrap());
        let start = clock.now();

        clock.advance(Duration::from_secs(1)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(1));

        clock.advance(Duration::from_secs(2)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_with_start_paused() {
        // Must not panic when time is already paused
        let clock = PausedClock::new().unwrap();
        let start = clock.now();
        clock.sleep(Duration::from_secs(30)).await;
        assert!(clock.now() - start >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_second_paused_clock_in_same_runtime() {
        let first = PausedClock::new().unwrap();
        let second = PausedClock::new().unwrap();
        let start = first.now();
        second.advance(Duration::from_secs(5)).await;
        assert_eq!(first.now() - start, Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_paused_clock_rejects_multi_thread_runtime() {
        let err = PausedClock::new().unwrap_err();
        assert!(matches!(
            err,
            ClockError::UnsupportedRuntime(RuntimeFlavor::MultiThread)
        ));

        // Time was left running
        let wall = std::time::Instant::now();
        let clock = SystemClock;
        clock.sleep(Duration::from_millis(20)).await;
        assert!(wall.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_paused_clock_outside_runtime() {
        assert!(matches!(PausedClock::new(), Err(ClockError::NoRuntime)));
    }

    #[test]
    fn test_paused_clock_really_pauses() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let clock = PausedClock::new().unwrap();
            let wall = std::time::Instant::now();
            let start = clock.now();
            clock.sleep(Duration::from_secs(3600)).await;
            assert!(clock.now() - start >= Duration::from_secs(3600));
            assert!(wall.elapsed() < Duration::from_secs(60));
        });
    }

    #[tokio::test]
    async fn test_system_clock_sleep() {
        let clock = SystemClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(10)).await;
        assert!(clock.now() - start >= Duration::from_millis(10));
    }
}
