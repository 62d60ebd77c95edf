//! Tolerant and strict invocation loops
//!
//! Both loops are strictly sequential: submit, wait for the confirmation,
//! then move to the next iteration. They differ only in what a failed
//! confirmation does.

use super::{DeployedContract, FailureTally};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a failed confirmation does to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and tally it, keep going
    Tolerant,
    /// Abort the loop with the error
    Strict,
}

/// Context attached to the error of an aborted strict loop
///
/// Carries the tally up to and including the failed iteration, so callers
/// can recover it with `err.downcast_ref::<StrictAbort>()`. The underlying
/// `ChainError` stays downcastable too.
#[derive(Debug, Clone)]
pub struct StrictAbort {
    /// Method the loop invoked
    pub method: String,
    /// Iteration whose confirmation failed
    pub iteration: u32,
    /// Outcomes so far; the last record is the failure
    pub tally: FailureTally,
}

impl fmt::Display for StrictAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed to confirm (iteration {})",
            self.method, self.iteration
        )
    }
}

/// Invoke `method` `iterations` times, tallying failed confirmations
///
/// Only the confirmation wait is tolerated. A submission error (contract
/// gone, unknown method) means the case itself is broken and is returned.
pub async fn run_tolerant(
    contract: &DeployedContract,
    method: &str,
    iterations: u32,
) -> Result<FailureTally> {
    let mut tally = FailureTally::new();

    for iteration in 0..iterations {
        let tx = contract
            .send(method)
            .await
            .with_context(|| format!("Failed to submit {} (iteration {})", method, iteration))?;
        let tx_hash = tx.tx_hash();

        match tx.wait().await {
            Ok(_) => tally.record_success(),
            Err(e) => {
                log::warn!("FAILED!!! {} iteration {}: {}", method, iteration, e);
                tally.record_failure(iteration, tx_hash, &e);
            }
        }
    }

    log::info!(
        "{}::{} x{}: {} confirmed, {} failed",
        contract.name(),
        method,
        iterations,
        tally.successes(),
        tally.failure_count()
    );
    Ok(tally)
}

/// Invoke `method` `iterations` times; the first failure aborts
pub async fn run_strict(
    contract: &DeployedContract,
    method: &str,
    iterations: u32,
) -> Result<FailureTally> {
    let mut tally = FailureTally::new();

    for iteration in 0..iterations {
        let tx = contract
            .send(method)
            .await
            .with_context(|| format!("Failed to submit {} (iteration {})", method, iteration))?;
        let tx_hash = tx.tx_hash();

        if let Err(e) = tx.wait().await {
            tally.record_failure(iteration, tx_hash, &e);
            return Err(e).context(StrictAbort {
                method: method.to_string(),
                iteration,
                tally,
            });
        }
        tally.record_success();
    }

    log::info!(
        "{}::{} x{}: all confirmed",
        contract.name(),
        method,
        iterations
    );
    Ok(tally)
}

/// Dispatch on `policy`
pub async fn run_with_policy(
    contract: &DeployedContract,
    method: &str,
    iterations: u32,
    policy: FailurePolicy,
) -> Result<FailureTally> {
    match policy {
        FailurePolicy::Tolerant => run_tolerant(contract, method, iterations).await,
        FailurePolicy::Strict => run_strict(contract, method, iterations).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, TestChainBuilder};
    use crate::contracts::why::{INC, RANDOM_FAIL, WORKS_WELL};
    use crate::harness::ContractFixture;
    use crate::orchestrator::PausedClock;
    use std::sync::Arc;

    fn fixture(seed: u64) -> ContractFixture {
        let chain = TestChainBuilder::new()
            .with_clock(Arc::new(PausedClock::new().unwrap()))
            .with_seed(seed)
            .build();
        ContractFixture::new(chain.connect(), "Why")
    }

    #[tokio::test]
    async fn test_tolerant_keeps_going() {
        let why = fixture(21).before_each().await.unwrap();
        let tally = run_tolerant(&why, RANDOM_FAIL, 40).await.unwrap();

        assert_eq!(tally.attempts(), 40);
        assert_eq!(tally.successes() + tally.failure_count(), 40);
        assert!(tally.failures().iter().all(|f| f.reverted));
        // randomFail never touches the counter
        assert_eq!(why.call_u64(INC).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tolerant_propagates_submission_errors() {
        let why = fixture(1).before_each().await.unwrap();
        let err = run_tolerant(&why, "noSuchMethod", 3).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChainError>(),
            Some(ChainError::UnknownMethod { .. })
        ));
    }

    #[tokio::test]
    async fn test_strict_aborts_on_first_revert() {
        let why = fixture(21).before_each().await.unwrap();
        let err = run_strict(&why, RANDOM_FAIL, 100).await.unwrap_err();
        let chain_err = err.downcast_ref::<ChainError>().unwrap();
        assert!(chain_err.is_revert());
        assert!(format!("{:#}", err).contains("failed to confirm"));
    }

    #[tokio::test]
    async fn test_strict_abort_keeps_partial_tally() {
        let why = fixture(21).before_each().await.unwrap();
        let err = run_strict(&why, RANDOM_FAIL, 100).await.unwrap_err();
        let abort = err.downcast_ref::<StrictAbort>().unwrap();

        assert_eq!(abort.method, RANDOM_FAIL);
        assert_eq!(abort.tally.attempts(), abort.iteration + 1);
        assert_eq!(abort.tally.successes(), abort.iteration);
        assert_eq!(abort.tally.failure_count(), 1);

        let failure = &abort.tally.failures()[0];
        assert_eq!(failure.iteration, abort.iteration);
        assert!(failure.reverted);
        assert!(failure.error.contains("randomFail: odd block timestamp"));
    }

    #[tokio::test]
    async fn test_dispatch() {
        let why = fixture(2).before_each().await.unwrap();
        let tally = run_with_policy(&why, WORKS_WELL, 5, FailurePolicy::Strict)
            .await
            .unwrap();
        assert_eq!(tally.successes(), 5);
        assert_eq!(why.call_u64(INC).await.unwrap(), 5);
    }
}
