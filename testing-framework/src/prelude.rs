//! Common imports for harness tests
//!
//! ```rust,ignore
//! use why_testing_framework::prelude::*;
//! ```

pub use crate::chain::{
    to_number, Address, ChainClient, ChainConfig, ChainError, TestChain, TestChainBuilder,
    TransactionReceipt, TxHash, TxStatus,
};
pub use crate::contracts::{ContractCode, ContractRegistry, WhyContract, U256};
pub use crate::harness::{
    query_counter, run_strict, run_tolerant, run_with_policy, Connection, ContractFactory,
    ContractFixture, DeployedContract, FailurePolicy, FailureTally, PendingTransaction,
};
pub use crate::invariants::{
    check_counter_matches, check_failures_observed, check_no_failures, check_tally_consistent,
};
pub use crate::orchestrator::{
    Clock, ClockError, DeterministicTestEnv, PausedClock, SystemClock, TestRng,
};
pub use crate::scenarios::{parse_suite, SuiteExecutor, SuiteReport, TestSuite};

pub use std::sync::Arc;
pub use tokio::time::Duration;
