//! Deploy-per-case fixture
//!
//! Every case gets its own contract instance, so no state leaks between
//! cases and nothing has to be torn down: the handle is simply dropped.

use super::{Connection, DeployedContract};
use anyhow::{Context, Result};
use std::future::Future;

/// Deploys a fresh instance of one named contract before each case
///
/// # Example
///
/// ```rust,ignore
/// let fixture = ContractFixture::new(chain.connect(), "Why");
/// fixture
///     .run_case("Should not fail on incrementing a variable", |why| async move {
///         run_strict(&why, "worksWell", 100).await?;
///         check_counter_matches(why.call_u64("inc").await?, 100)
///     })
///     .await?;
/// ```
#[derive(Clone)]
pub struct ContractFixture {
    connection: Connection,
    contract_name: String,
}

impl ContractFixture {
    /// Fixture for the artifact `contract_name`
    pub fn new(connection: Connection, contract_name: impl Into<String>) -> Self {
        Self {
            connection,
            contract_name: contract_name.into(),
        }
    }

    /// Contract this fixture deploys
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Look up the factory, deploy, wait for the deployment
    ///
    /// # Errors
    ///
    /// Any lookup, submission or confirmation failure. Callers are expected
    /// to abort the case.
    pub async fn before_each(&self) -> Result<DeployedContract> {
        let factory = self
            .connection
            .get_contract_factory(&self.contract_name)
            .await
            .with_context(|| format!("No contract factory for '{}'", self.contract_name))?;

        let pending = factory
            .deploy()
            .await
            .with_context(|| format!("Failed to submit deployment of '{}'", self.contract_name))?;

        let contract = pending
            .deployed()
            .await
            .with_context(|| format!("Deployment of '{}' did not confirm", self.contract_name))?;

        log::debug!("Fresh {} at {}", self.contract_name, contract.address());
        Ok(contract)
    }

    /// Deploy a fresh instance, then run `body` against it
    pub async fn run_case<F, Fut, T>(&self, case_name: &str, body: F) -> Result<T>
    where
        F: FnOnce(DeployedContract) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        log::info!("Running case: {}", case_name);
        let contract = self
            .before_each()
            .await
            .with_context(|| format!("Setup failed for case '{}'", case_name))?;
        body(contract)
            .await
            .with_context(|| format!("Case '{}' failed", case_name))
    }
}
