// File: testing-framework/src/orchestrator/mod.rs
//
// Orchestrator Module
//
// Owns every source of nondeterminism a harness run touches (time and
// randomness) so that any run can be reproduced from its seed.

/// Clock abstractions for deterministic time control in tests
pub mod clock;
/// Deterministic random number generation for reproducible tests
pub mod rng;

use std::sync::Arc;

/// Clock + RNG bundle handed to the simulated chain
///
/// # Example
///
/// ```rust
/// use why_testing_framework::orchestrator::DeterministicTestEnv;
/// use why_testing_framework::chain::TestChainBuilder;
///
/// #[tokio::test]
/// async fn test_reproducible_chain() {
///     let env = DeterministicTestEnv::new_time_paused_with_seed(0xa3f5).unwrap();
///     let chain = TestChainBuilder::new().with_env(&env).build();
///     // ... deploy and call contracts ...
/// #   let _ = chain;
/// }
/// ```
pub struct DeterministicTestEnv {
    /// Clock for time control (SystemClock or PausedClock)
    pub clock: Arc<dyn Clock>,

    /// Seeded RNG for reproducible randomness
    pub rng: Arc<TestRng>,
}

impl DeterministicTestEnv {
    /// Paused time, seed from `WHY_TEST_SEED` or random (logged)
    ///
    /// # Errors
    ///
    /// Must run inside a current-thread tokio runtime (`#[tokio::test]`).
    pub fn new_time_paused() -> Result<Self, ClockError> {
        Ok(Self {
            clock: Arc::new(clock::PausedClock::new()?),
            rng: Arc::new(rng::TestRng::new_from_env_or_random()),
        })
    }

    /// Real time with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: Arc::new(clock::SystemClock),
            rng: Arc::new(rng::TestRng::with_seed(seed)),
        }
    }

    /// Paused time with a fixed seed
    pub fn new_time_paused_with_seed(seed: u64) -> Result<Self, ClockError> {
        Ok(Self {
            clock: Arc::new(clock::PausedClock::new()?),
            rng: Arc::new(rng::TestRng::with_seed(seed)),
        })
    }

    /// Paused time, seed from `WHY_TEST_SEED` or `default_seed`
    ///
    /// A pinned seed keeps the test stable; the variable still replays it.
    pub fn new_time_paused_or_seed(default_seed: u64) -> Result<Self, ClockError> {
        Ok(Self {
            clock: Arc::new(clock::PausedClock::new()?),
            rng: Arc::new(rng::TestRng::new_from_env_or(default_seed)),
        })
    }

    /// Advance paused time
    pub async fn advance_time(&self, duration: tokio::time::Duration) {
        tokio::time::advance(duration).await
    }

    /// Seed of the underlying RNG
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Print replay instructions to stderr
    ///
    /// ```text
    /// Test failed! Replay with:
    ///    WHY_TEST_SEED=0xa3f5c8e1b2d94706 cargo test ...
    /// ```
    pub fn on_failure(&self) {
        eprintln!("Test failed! Replay with:");
        eprintln!(
            "   {}=0x{:016x} cargo test ...",
            rng::SEED_ENV_VAR,
            self.rng.seed()
        );
    }
}

pub use clock::{Clock, ClockError, PausedClock, SystemClock};
pub use rng::TestRng;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn test_time_advancement() {
        let env = DeterministicTestEnv::new_time_paused_with_seed(9).unwrap();
        let start = env.clock.now();

        env.advance_time(Duration::from_secs(100)).await;

        assert_eq!(env.clock.now() - start, Duration::from_secs(100));
    }

    #[tokio::test]
    async fn test_deterministic_rng() {
        let env1 = DeterministicTestEnv::with_seed(42);
        let env2 = DeterministicTestEnv::with_seed(42);

        let values1: Vec<u64> = (0..10).map(|_| env1.rng.gen()).collect();
        let values2: Vec<u64> = (0..10).map(|_| env2.rng.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[tokio::test]
    async fn test_seed_retrieval() {
        let seed = 0xdeadbeefcafebabe;
        let env = DeterministicTestEnv::with_seed(seed);
        assert_eq!(env.seed(), seed);
        env.on_failure();
    }
}
