//! # Why Testing Framework
//!
//! Deterministic contract test harness: deploy a fresh contract before each
//! case, invoke methods in a sequential await loop, and assert on
//! confirmation outcomes and final state.
//!
//! ## Architecture Overview
//!
//! - **orchestrator**: Clock + seeded RNG, the only sources of nondeterminism
//! - **chain**: `ChainClient` seam and the in-process `TestChain`
//! - **contracts**: contract runtime and the `Why` contract
//! - **harness**: factory/handles, deploy-per-case fixture, tolerant and
//!   strict loops, failure tally
//! - **invariants**: post-condition checkers
//! - **scenarios**: YAML suite parser and executor
//! - **utilities**: failure artifacts and replay
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use why_testing_framework::prelude::*;
//!
//! #[tokio::test]
//! async fn test_works_well() -> anyhow::Result<()> {
//!     let env = DeterministicTestEnv::new_time_paused()?;
//!     let chain = TestChainBuilder::new().with_env(&env).build();
//!     let fixture = ContractFixture::new(chain.connect(), "Why");
//!
//!     let why = fixture.before_each().await?;
//!     run_strict(&why, "worksWell", 100).await?;
//!     check_counter_matches(query_counter(&why, "inc").await?, 100)
//! }
//! ```
//!
//! Failing runs log their seed; replay with `WHY_TEST_SEED=0x... cargo test`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Core orchestration - provides Clock, RNG, deterministic environment
pub mod orchestrator;

/// Chain client seam and in-process test chain
pub mod chain;

/// Contract runtime and bundled contracts
pub mod contracts;

/// Contract test harness
pub mod harness;

/// Post-condition checkers
pub mod invariants;

/// YAML suite parser and executor
pub mod scenarios;

/// Failure artifacts and replay
pub mod utilities;

/// Convenient re-exports for common usage
pub mod prelude;

pub use chain::{ChainClient, ChainError, TestChain, TestChainBuilder};
pub use harness::{ContractFixture, FailurePolicy, FailureTally};
pub use orchestrator::{Clock, DeterministicTestEnv, PausedClock, SystemClock, TestRng};

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
