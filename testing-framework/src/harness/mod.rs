// File: testing-framework/src/harness/mod.rs
//
// Contract Test Harness
//
// Deploy a fresh contract before each case, invoke methods in a strictly
// sequential await loop, and assert on confirmation outcomes and on the
// final read-only state.

mod contract;
mod fixture;
mod policy;
mod tally;


pub use contract::{
    Connection, ContractFactory, DeployedContract, PendingDeployment, PendingTransaction,
};
pub use fixture::ContractFixture;
pub use policy::{run_strict, run_tolerant, run_with_policy, FailurePolicy, StrictAbort};
pub use tally::{FailureRecord, FailureTally};

use anyhow::{Context, Result};

/// Read a counter-style view and convert it to `u64`
pub async fn query_counter(contract: &DeployedContract, method: &str) -> Result<u64> {
    contract
        .call_u64(method)
        .await
        .with_context(|| format!("Query {}::{} failed", contract.name(), method))
}
