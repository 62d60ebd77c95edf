//! Contract factory, contract handle and transaction handle
//!
//! Mirrors the usual development-framework flow:
//!
//! ```rust,ignore
//! let factory = connection.get_contract_factory("Why").await?;
//! let why = factory.deploy().await?.deployed().await?;
//! let tx = why.send("worksWell").await?;
//! tx.wait().await?;
//! assert_eq!(why.call_u64("inc").await?, 1);
//! ```

use crate::chain::{
    to_number, Address, ChainClient, ChainError, TransactionReceipt, TxHash, TxStatus,
};
use crate::orchestrator::Clock;
use primitive_types::U256;
use std::sync::Arc;
use tokio::time::Duration;

/// Client + clock + confirmation settings shared by every handle
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl Connection {
    /// Connect through `client`, polling receipts with `clock`
    pub fn new(client: Arc<dyn ChainClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            poll_interval: Duration::from_millis(100),
            confirmation_timeout: Duration::from_secs(30),
        }
    }

    /// Receipt polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Deadline of a confirmation wait
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Underlying client
    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Factory for the artifact registered under `name`
    ///
    /// # Errors
    ///
    /// `ChainError::ArtifactNotFound` if the client has no such artifact.
    pub async fn get_contract_factory(&self, name: &str) -> Result<ContractFactory, ChainError> {
        if !self.client.has_artifact(name).await? {
            return Err(ChainError::ArtifactNotFound(name.to_string()));
        }
        Ok(ContractFactory {
            connection: self.clone(),
            name: name.to_string(),
        })
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ChainError> {
        let start = self.clock.now();
        loop {
            if let Some(receipt) = self.client.get_receipt(&tx_hash).await? {
                return match &receipt.status {
                    TxStatus::Success => Ok(receipt),
                    TxStatus::Reverted { reason } => Err(ChainError::Reverted {
                        tx_hash,
                        reason: reason.clone(),
                    }),
                };
            }

            let waited = self.clock.now() - start;
            if waited >= self.confirmation_timeout {
                return Err(ChainError::ConfirmationTimeout { tx_hash, waited });
            }
            self.clock.sleep(self.poll_interval).await;
        }
    }
}

/// Deployer for one named artifact
#[derive(Clone)]
pub struct ContractFactory {
    connection: Connection,
    name: String,
}

impl ContractFactory {
    /// Artifact name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a deployment
    pub async fn deploy(&self) -> Result<PendingDeployment, ChainError> {
        let (tx_hash, address) = self.connection.client.deploy_contract(&self.name).await?;
        log::debug!("Deploying {} to {} (tx {})", self.name, address, tx_hash);
        Ok(PendingDeployment {
            connection: self.connection.clone(),
            name: self.name.clone(),
            tx_hash,
            address,
        })
    }
}

/// A deployment that has been submitted but not confirmed
pub struct PendingDeployment {
    connection: Connection,
    name: String,
    tx_hash: TxHash,
    address: Address,
}

impl PendingDeployment {
    /// Creation transaction
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait for the creation transaction and return the live handle
    pub async fn deployed(self) -> Result<DeployedContract, ChainError> {
        self.connection.wait_for_receipt(self.tx_hash).await?;
        Ok(DeployedContract {
            connection: self.connection,
            name: self.name,
            address: self.address,
        })
    }
}

/// Handle to a deployed contract instance
#[derive(Clone)]
pub struct DeployedContract {
    connection: Connection,
    name: String,
    address: Address,
}

impl DeployedContract {
    /// Artifact name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Submit a state-changing call
    ///
    /// Succeeds as soon as the chain accepts the transaction; a revert only
    /// surfaces from `PendingTransaction::wait`.
    pub async fn send(&self, method: &str) -> Result<PendingTransaction, ChainError> {
        let tx_hash = self
            .connection
            .client
            .send_transaction(&self.address, method)
            .await?;
        Ok(PendingTransaction {
            connection: self.connection.clone(),
            tx_hash,
        })
    }

    /// Evaluate a read-only method
    pub async fn call(&self, method: &str) -> Result<U256, ChainError> {
        self.connection.client.call(&self.address, method).await
    }

    /// Evaluate a read-only method and convert the result to `u64`
    pub async fn call_u64(&self, method: &str) -> Result<u64, ChainError> {
        to_number(self.call(method).await?)
    }
}

/// A submitted transaction
pub struct PendingTransaction {
    connection: Connection,
    tx_hash: TxHash,
}

impl PendingTransaction {
    /// Transaction hash
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait until the transaction is mined
    ///
    /// # Errors
    ///
    /// - `ChainError::Reverted` if the transaction reverted
    /// - `ChainError::ConfirmationTimeout` if no receipt appears in time
    pub async fn wait(self) -> Result<TransactionReceipt, ChainError> {
        self.connection.wait_for_receipt(self.tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TestChainBuilder;
    use crate::contracts::why::{INC, WORKS_WELL};
    use crate::orchestrator::PausedClock;

    #[tokio::test]
    async fn test_deploy_send_wait_call() {
        let chain = TestChainBuilder::new()
            .with_clock(Arc::new(PausedClock::new().unwrap()))
            .with_seed(1)
            .build();
        let connection = chain.connect();

        let factory = connection.get_contract_factory("Why").await.unwrap();
        assert_eq!(factory.name(), "Why");
        let why = factory.deploy().await.unwrap().deployed().await.unwrap();

        let receipt = why.send(WORKS_WELL).await.unwrap().wait().await.unwrap();
        assert_eq!(receipt.method.as_deref(), Some(WORKS_WELL));
        assert_eq!(receipt.contract, why.address());
        assert_eq!(why.call_u64(INC).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_artifact() {
        let chain = TestChainBuilder::new().with_seed(1).build();
        let result = chain.connect().get_contract_factory("Nope").await;
        assert!(matches!(result, Err(ChainError::ArtifactNotFound(name)) if name == "Nope"));
    }

    #[tokio::test]
    async fn test_wait_times_out_without_mining() {
        let chain = TestChainBuilder::new()
            .with_clock(Arc::new(PausedClock::new().unwrap()))
            .with_seed(1)
            .with_automine(false)
            .with_poll_interval(Duration::from_secs(1))
            .with_confirmation_timeout(Duration::from_secs(5))
            .build();
        let connection = chain.connect();

        let pending = connection
            .get_contract_factory("Why")
            .await
            .unwrap()
            .deploy()
            .await
            .unwrap();
        let tx_hash = pending.tx_hash();

        // Paused time auto-advances through the polling sleeps
        match pending.deployed().await {
            Err(ChainError::ConfirmationTimeout { tx_hash: hash, waited }) => {
                assert_eq!(hash, tx_hash);
                assert!(waited >= Duration::from_secs(5));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("deployment confirmed without a block"),
        }
    }

    #[tokio::test]
    async fn test_wait_sees_block_mined_meanwhile() {
        let chain = TestChainBuilder::new()
            .with_clock(Arc::new(PausedClock::new().unwrap()))
            .with_seed(1)
            .with_automine(false)
            .build();
        let connection = chain.connect();

        let pending = connection
            .get_contract_factory("Why")
            .await
            .unwrap()
            .deploy()
            .await
            .unwrap();

        let miner = {
            let chain = chain.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                chain.mine_block().await
            })
        };

        let why = pending.deployed().await.unwrap();
        let block = miner.await.unwrap();
        assert_eq!(block.number, 1);
        assert_eq!(why.call_u64(INC).await.unwrap(), 0);
    }
}
