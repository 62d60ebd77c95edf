//! Post-condition checkers
//!
//! Checked once, after a case's loop has finished:
//! - Counter equals the number of confirmed increments
//! - At least one failure was observed (skipped for empty loops)
//! - No failure was observed
//! - Tally accounts for every iteration

use crate::harness::FailureTally;
use anyhow::{ensure, Result};

/// Final counter must equal the expected invocation count exactly
pub fn check_counter_matches(counter: u64, expected: u64) -> Result<()> {
    ensure!(
        counter == expected,
        "Counter mismatch: expected {}, got {}",
        expected,
        counter
    );
    Ok(())
}

/// A nondeterministically failing method must have failed at least once
///
/// An empty loop cannot observe anything, so the check passes vacuously
/// when no attempt was made.
pub fn check_failures_observed(tally: &FailureTally) -> Result<()> {
    if tally.attempts() == 0 {
        log::debug!("No attempts made, skipping failures-observed check");
        return Ok(());
    }
    ensure!(
        tally.failure_count() != 0,
        "Expected at least one failure in {} attempts, saw none",
        tally.attempts()
    );
    Ok(())
}

/// Every confirmation must have succeeded
pub fn check_no_failures(tally: &FailureTally) -> Result<()> {
    if let Some(first) = tally.failures().first() {
        anyhow::bail!(
            "{} of {} confirmations failed, first at iteration {}: {}",
            tally.failure_count(),
            tally.attempts(),
            first.iteration,
            first.error
        );
    }
    Ok(())
}

/// Successes and failures must add up to the iterations that ran
pub fn check_tally_consistent(tally: &FailureTally, iterations: u32) -> Result<()> {
    ensure!(
        tally.attempts() == iterations,
        "Tally saw {} attempts for {} iterations",
        tally.attempts(),
        iterations
    );
    ensure!(
        tally.successes() + tally.failure_count() == tally.attempts(),
        "Tally does not add up: {} + {} != {}",
        tally.successes(),
        tally.failure_count(),
        tally.attempts()
    );
    Ok(())
}
