// File: testing-framework/src/chain/mod.rs
//
// Chain Client Seam
//
// The harness never talks to a chain directly. Everything it needs (artifact
// lookup, deployment, transaction submission, receipts, read-only queries)
// goes through the ChainClient trait, so the same harness runs against the
// in-process TestChain or any other implementation.

mod error;
mod test_chain;

pub use error::ChainError;
pub use test_chain::{Block, ChainConfig, TestChain, TestChainBuilder};

use async_trait::async_trait;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw bytes
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Identifier whose trailing eight bytes encode `index`
            pub fn from_index(index: u64) -> Self {
                let mut bytes = [0u8; 32];
                bytes[24..].copy_from_slice(&index.to_be_bytes());
                Self(bytes)
            }

            /// Raw bytes
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

define_id!(
    /// Address of a deployed contract
    Address
);
define_id!(
    /// Hash identifying a submitted transaction
    TxHash
);

/// Final status of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    /// State changes were committed
    Success,
    /// State changes were rolled back
    Reverted {
        /// Reason reported by the contract
        reason: String,
    },
}

/// Receipt of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Contract that was called, or created for a deployment
    pub contract: Address,
    /// Called method; `None` for a deployment
    pub method: Option<String>,
    /// Block that included the transaction
    pub block_number: u64,
    /// Timestamp of that block
    pub block_timestamp: u64,
    /// Outcome
    pub status: TxStatus,
}

impl TransactionReceipt {
    /// Whether the transaction committed
    pub fn is_success(&self) -> bool {
        matches!(self.status, TxStatus::Success)
    }
}

/// Chain interaction used by the contract test harness
///
/// Submission and confirmation are split: `deploy_contract` and
/// `send_transaction` only hand back a hash, and the outcome is observed
/// later through `get_receipt`. A revert is never an error at submission
/// time.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Whether a compiled artifact is registered under `name`
    async fn has_artifact(&self, name: &str) -> Result<bool, ChainError>;

    /// Submit a deployment of the named artifact
    ///
    /// # Returns
    ///
    /// The creation transaction hash and the address the contract will
    /// occupy once the transaction is mined.
    async fn deploy_contract(&self, name: &str) -> Result<(TxHash, Address), ChainError>;

    /// Submit a call to a state-changing method
    ///
    /// # Errors
    ///
    /// Returns an error if the contract is not deployed, the method does not
    /// exist, or the method is read-only.
    async fn send_transaction(&self, contract: &Address, method: &str)
        -> Result<TxHash, ChainError>;

    /// Receipt of a transaction, `None` while it is still pending
    async fn get_receipt(&self, tx_hash: &TxHash)
        -> Result<Option<TransactionReceipt>, ChainError>;

    /// Evaluate a read-only method against the latest state
    async fn call(&self, contract: &Address, method: &str) -> Result<U256, ChainError>;

    /// Number of the latest mined block
    async fn block_number(&self) -> Result<u64, ChainError>;
}

/// Convert a 256-bit value to `u64`, failing instead of truncating
pub fn to_number(value: U256) -> Result<u64, ChainError> {
    if value > U256::from(u64::MAX) {
        return Err(ChainError::ValueOverflow(value.to_string()));
    }
    Ok(value.low_u64())
}
