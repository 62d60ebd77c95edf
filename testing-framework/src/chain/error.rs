//! Errors surfaced by a chain client

use super::{Address, TxHash};
use thiserror::Error;
use tokio::time::Duration;

/// Failure of a chain interaction
///
/// Reverts and transport-style failures (timeouts) share one type: callers
/// see them identically, as a failed confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No compiled artifact is registered under this name
    #[error("Contract artifact '{0}' not found")]
    ArtifactNotFound(String),

    /// Nothing is deployed at this address (or its deployment is still pending)
    #[error("No contract deployed at {0}")]
    ContractNotDeployed(Address),

    /// The contract ABI has no method with this name
    #[error("Contract {contract} has no method '{method}'")]
    UnknownMethod {
        /// Target contract
        contract: Address,
        /// Requested method
        method: String,
    },

    /// A read-only method was submitted as a transaction
    #[error("Method '{0}' is read-only and cannot be sent as a transaction")]
    NotAMutator(String),

    /// A state-changing method was invoked as a read-only query
    #[error("Method '{0}' mutates state and cannot be queried")]
    NotAView(String),

    /// The chain never saw this transaction
    #[error("Unknown transaction {0}")]
    UnknownTransaction(TxHash),

    /// The transaction was mined but reverted
    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted {
        /// Reverted transaction
        tx_hash: TxHash,
        /// Revert reason reported by the contract
        reason: String,
    },

    /// A read-only query reverted
    #[error("Call to '{method}' reverted: {reason}")]
    CallReverted {
        /// Queried method
        method: String,
        /// Revert reason reported by the contract
        reason: String,
    },

    /// No receipt appeared before the confirmation deadline
    #[error("Transaction {tx_hash} not confirmed after {waited:?}")]
    ConfirmationTimeout {
        /// Pending transaction
        tx_hash: TxHash,
        /// Time spent waiting
        waited: Duration,
    },

    /// A 256-bit value does not fit the requested native integer
    #[error("Value {0} overflows u64")]
    ValueOverflow(String),
}

impl ChainError {
    /// Whether this error is a mined-but-reverted transaction
    pub fn is_revert(&self) -> bool {
        matches!(self, ChainError::Reverted { .. })
    }
}
