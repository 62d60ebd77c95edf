//! Per-case accumulator of confirmation outcomes

use crate::chain::{ChainError, TxHash};
use serde::{Deserialize, Serialize};

/// One failed confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Zero-based loop iteration
    pub iteration: u32,
    /// Transaction that failed to confirm
    pub tx_hash: TxHash,
    /// Rendered error
    pub error: String,
    /// Whether the chain reported a revert (as opposed to e.g. a timeout)
    pub reverted: bool,
}

/// Counts attempts, successes and failures of one test case
///
/// Every failure must go through `record_failure`; there is no other way to
/// change the failure count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureTally {
    attempts: u32,
    successes: u32,
    failures: Vec<FailureRecord>,
}

impl FailureTally {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a confirmed transaction
    pub fn record_success(&mut self) {
        self.attempts += 1;
        self.successes += 1;
    }

    /// Count a failed confirmation
    pub fn record_failure(&mut self, iteration: u32, tx_hash: TxHash, error: &ChainError) {
        self.attempts += 1;
        self.failures.push(FailureRecord {
            iteration,
            tx_hash,
            error: error.to_string(),
            reverted: error.is_revert(),
        });
    }

    /// Confirmations awaited so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Confirmed transactions
    pub fn successes(&self) -> u32 {
        self.successes
    }

    /// Failed confirmations
    pub fn failure_count(&self) -> u32 {
        // len() is bounded by attempts, itself a u32
        self.failures.len() as u32
    }

    /// Failure details in loop order
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut tally = FailureTally::new();
        tally.record_success();
        tally.record_failure(
            1,
            TxHash::from_index(2),
            &ChainError::Reverted {
                tx_hash: TxHash::from_index(2),
                reason: "odd".to_string(),
            },
        );
        tally.record_success();

        assert_eq!(tally.attempts(), 3);
        assert_eq!(tally.successes(), 2);
        assert_eq!(tally.failure_count(), 1);
        assert_eq!(tally.failures()[0].iteration, 1);
        assert!(tally.failures()[0].reverted);
        assert!(tally.failures()[0].error.contains("odd"));
    }
}
