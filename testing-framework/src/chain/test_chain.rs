//! TestChain - in-process simulated chain
//!
//! A development-node stand-in: contracts come from a `ContractRegistry`,
//! every mutator call runs against a scratch copy of the contract storage,
//! and blocks carry strictly increasing timestamps drawn from the injected
//! clock plus seeded jitter.
//!
//! With automine (the default) each submitted transaction is mined into its
//! own block before the submission returns, so its receipt is available
//! immediately. With automine off, transactions wait in the mempool until
//! `mine_block()`.

use super::{Address, ChainClient, ChainError, TransactionReceipt, TxHash, TxStatus};
use crate::contracts::{BlockEnv, ContractCode, ContractRegistry, ContractStorage, MethodKind};
use crate::harness::Connection;
use crate::orchestrator::{Clock, DeterministicTestEnv, SystemClock, TestRng};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Chain parameters
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Mine every submitted transaction immediately
    pub automine: bool,
    /// Timestamp of block 0 (2024-01-01 00:00:00 UTC by default)
    pub genesis_timestamp: u64,
    /// Upper bound (inclusive) of the random seconds added to each block
    pub max_timestamp_jitter: u64,
    /// How often a confirmation wait polls for its receipt
    pub poll_interval: Duration,
    /// How long a confirmation wait polls before giving up
    pub confirmation_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            automine: true,
            genesis_timestamp: 1_704_067_200,
            max_timestamp_jitter: 1,
            poll_interval: Duration::from_millis(100),
            confirmation_timeout: Duration::from_secs(30),
        }
    }
}

/// A mined block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Height, genesis is 0
    pub number: u64,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    /// Included transactions in execution order
    pub transactions: Vec<TxHash>,
}

#[derive(Debug, Clone)]
enum PendingKind {
    Deploy { artifact: String },
    Call { method: String },
}

#[derive(Debug, Clone)]
struct PendingTx {
    hash: TxHash,
    contract: Address,
    kind: PendingKind,
}

struct DeployedInstance {
    code: Arc<dyn ContractCode>,
    storage: ContractStorage,
}

struct ChainState {
    blocks: Vec<Block>,
    contracts: HashMap<Address, DeployedInstance>,
    mempool: Vec<PendingTx>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    next_tx_index: u64,
    next_contract_index: u64,
}

/// In-process chain implementing `ChainClient`
pub struct TestChain {
    config: ChainConfig,
    registry: ContractRegistry,
    clock: Arc<dyn Clock>,
    rng: Arc<TestRng>,
    started_at: Instant,
    state: Mutex<ChainState>,
}

impl TestChain {
    /// Chain configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Injected clock
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Seed of the RNG driving timestamp jitter
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Harness connection bound to this chain, its clock and wait settings
    pub fn connect(self: &Arc<Self>) -> Connection {
        Connection::new(self.clone(), self.clock.clone())
            .with_poll_interval(self.config.poll_interval)
            .with_confirmation_timeout(self.config.confirmation_timeout)
    }

    /// Latest block
    pub fn tip(&self) -> Block {
        let state = self.state.lock();
        // blocks always holds at least genesis
        state.blocks[state.blocks.len() - 1].clone()
    }

    /// Block at `number`
    pub fn block(&self, number: u64) -> Option<Block> {
        let state = self.state.lock();
        usize::try_from(number)
            .ok()
            .and_then(|idx| state.blocks.get(idx).cloned())
    }

    /// Transactions waiting to be mined
    pub fn pending_count(&self) -> usize {
        self.state.lock().mempool.len()
    }

    /// Raw storage slot of a deployed contract
    pub fn storage_at(&self, contract: &Address, slot: &str) -> Option<U256> {
        let state = self.state.lock();
        state
            .contracts
            .get(contract)
            .map(|instance| instance.storage.get(slot))
    }

    /// Mine every pending transaction into one new block
    ///
    /// An empty mempool still produces an (empty) block.
    pub async fn mine_block(&self) -> Block {
        let mut state = self.state.lock();
        self.mine_locked(&mut state)
    }

    fn mine_locked(&self, state: &mut ChainState) -> Block {
        let prev = &state.blocks[state.blocks.len() - 1];
        let number = prev.number + 1;
        let timestamp = self.next_timestamp(prev.timestamp);
        let env = BlockEnv { number, timestamp };

        let pending = std::mem::take(&mut state.mempool);
        let mut included = Vec::with_capacity(pending.len());
        for tx in pending {
            let receipt = self.execute(state, &tx, &env);
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "Mined {} ({:?}) in block {} at {}: {:?}",
                    tx.hash,
                    tx.kind,
                    number,
                    timestamp,
                    receipt.status
                );
            }
            state.receipts.insert(tx.hash, receipt);
            included.push(tx.hash);
        }

        let block = Block {
            number,
            timestamp,
            transactions: included,
        };
        state.blocks.push(block.clone());
        block
    }

    fn next_timestamp(&self, prev: u64) -> u64 {
        let elapsed = self.clock.now().saturating_duration_since(self.started_at);
        let wall = self.config.genesis_timestamp.saturating_add(elapsed.as_secs());
        let jitter = if self.config.max_timestamp_jitter == 0 {
            0
        } else {
            self.rng.gen_range(0..=self.config.max_timestamp_jitter)
        };
        // Pinned at u64::MAX once the range is exhausted
        prev.saturating_add(1).max(wall).saturating_add(jitter)
    }

    fn execute(&self, state: &mut ChainState, tx: &PendingTx, env: &BlockEnv) -> TransactionReceipt {
        let (method, status) = match &tx.kind {
            PendingKind::Deploy { artifact } => {
                let status = match self.registry.get(artifact) {
                    Some(code) => {
                        let mut storage = ContractStorage::default();
                        match code.construct(&mut storage, env) {
                            Ok(()) => {
                                log::info!("Deployed {} at {}", artifact, tx.contract);
                                state
                                    .contracts
                                    .insert(tx.contract, DeployedInstance { code, storage });
                                TxStatus::Success
                            }
                            Err(revert) => TxStatus::Reverted {
                                reason: revert.reason,
                            },
                        }
                    }
                    // Checked at submission; only reachable if the registry changed
                    None => TxStatus::Reverted {
                        reason: format!("artifact {} vanished", artifact),
                    },
                };
                (None, status)
            }
            PendingKind::Call { method } => {
                let status = match state.contracts.get_mut(&tx.contract) {
                    Some(instance) => {
                        let mut scratch = instance.storage.clone();
                        match instance.code.execute(method, &mut scratch, env) {
                            Ok(()) => {
                                instance.storage = scratch;
                                TxStatus::Success
                            }
                            Err(revert) => TxStatus::Reverted {
                                reason: revert.reason,
                            },
                        }
                    }
                    None => TxStatus::Reverted {
                        reason: format!("no contract at {}", tx.contract),
                    },
                };
                (Some(method.clone()), status)
            }
        };

        TransactionReceipt {
            tx_hash: tx.hash,
            contract: tx.contract,
            method,
            block_number: env.number,
            block_timestamp: env.timestamp,
            status,
        }
    }

    fn submit(&self, state: &mut ChainState, contract: Address, kind: PendingKind) -> TxHash {
        state.next_tx_index += 1;
        let hash = TxHash::from_index(state.next_tx_index);
        state.mempool.push(PendingTx {
            hash,
            contract,
            kind,
        });
        if self.config.automine {
            self.mine_locked(state);
        }
        hash
    }
}

#[async_trait]
impl ChainClient for TestChain {
    async fn has_artifact(&self, name: &str) -> Result<bool, ChainError> {
        Ok(self.registry.get(name).is_some())
    }

    async fn deploy_contract(&self, name: &str) -> Result<(TxHash, Address), ChainError> {
        if self.registry.get(name).is_none() {
            return Err(ChainError::ArtifactNotFound(name.to_string()));
        }

        let mut state = self.state.lock();
        state.next_contract_index += 1;
        let address = Address::from_index(state.next_contract_index);
        let hash = self.submit(
            &mut state,
            address,
            PendingKind::Deploy {
                artifact: name.to_string(),
            },
        );
        Ok((hash, address))
    }

    async fn send_transaction(
        &self,
        contract: &Address,
        method: &str,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock();
        let instance = state
            .contracts
            .get(contract)
            .ok_or(ChainError::ContractNotDeployed(*contract))?;

        match instance.code.method_kind(method) {
            Some(MethodKind::Mutator) => {}
            Some(MethodKind::View) => return Err(ChainError::NotAMutator(method.to_string())),
            None => {
                return Err(ChainError::UnknownMethod {
                    contract: *contract,
                    method: method.to_string(),
                })
            }
        }

        Ok(self.submit(
            &mut state,
            *contract,
            PendingKind::Call {
                method: method.to_string(),
            },
        ))
    }

    async fn get_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        let state = self.state.lock();
        if let Some(receipt) = state.receipts.get(tx_hash) {
            return Ok(Some(receipt.clone()));
        }
        if state.mempool.iter().any(|tx| &tx.hash == tx_hash) {
            return Ok(None);
        }
        Err(ChainError::UnknownTransaction(*tx_hash))
    }

    async fn call(&self, contract: &Address, method: &str) -> Result<U256, ChainError> {
        let state = self.state.lock();
        let instance = state
            .contracts
            .get(contract)
            .ok_or(ChainError::ContractNotDeployed(*contract))?;

        match instance.code.method_kind(method) {
            Some(MethodKind::View) => {}
            Some(MethodKind::Mutator) => return Err(ChainError::NotAView(method.to_string())),
            None => {
                return Err(ChainError::UnknownMethod {
                    contract: *contract,
                    method: method.to_string(),
                })
            }
        }

        instance
            .code
            .query(method, &instance.storage)
            .map_err(|revert| ChainError::CallReverted {
                method: method.to_string(),
                reason: revert.reason,
            })
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.tip().number)
    }
}

/// Fluent configuration for `TestChain`
///
/// # Example
///
/// ```rust,ignore
/// let chain = TestChainBuilder::new()
///     .with_clock(clock)
///     .with_seed(0xa3f5)
///     .with_automine(false)
///     .build();
/// ```
pub struct TestChainBuilder {
    config: ChainConfig,
    registry: ContractRegistry,
    clock: Option<Arc<dyn Clock>>,
    rng: Option<Arc<TestRng>>,
}

impl TestChainBuilder {
    /// Defaults: SystemClock, seed from `WHY_TEST_SEED` or random, automine,
    /// bundled contracts
    pub fn new() -> Self {
        Self {
            config: ChainConfig::default(),
            registry: ContractRegistry::with_defaults(),
            clock: None,
            rng: None,
        }
    }

    /// Use the clock and RNG of a deterministic environment
    pub fn with_env(mut self, env: &DeterministicTestEnv) -> Self {
        self.clock = Some(env.clock.clone());
        self.rng = Some(env.rng.clone());
        self
    }

    /// Set clock implementation
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing RNG
    pub fn with_rng(mut self, rng: Arc<TestRng>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Fresh RNG from a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(Arc::new(TestRng::with_seed(seed)));
        self
    }

    /// Replace the artifact registry
    pub fn with_registry(mut self, registry: ContractRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register one more artifact
    pub fn with_contract(mut self, code: Arc<dyn ContractCode>) -> Self {
        self.registry.register(code);
        self
    }

    /// Toggle mining on submission
    pub fn with_automine(mut self, automine: bool) -> Self {
        self.config.automine = automine;
        self
    }

    /// Timestamp of block 0
    pub fn with_genesis_timestamp(mut self, timestamp: u64) -> Self {
        self.config.genesis_timestamp = timestamp;
        self
    }

    /// Maximum random seconds added per block (0 disables jitter)
    pub fn with_max_timestamp_jitter(mut self, jitter: u64) -> Self {
        self.config.max_timestamp_jitter = jitter;
        self
    }

    /// Receipt polling interval for confirmation waits
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Deadline for confirmation waits
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.config.confirmation_timeout = timeout;
        self
    }

    /// Build the chain with its genesis block
    pub fn build(self) -> Arc<TestChain> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let rng = self
            .rng
            .unwrap_or_else(|| Arc::new(TestRng::new_from_env_or_random()));

        let genesis = Block {
            number: 0,
            timestamp: self.config.genesis_timestamp,
            transactions: Vec::new(),
        };

        Arc::new(TestChain {
            config: self.config,
            registry: self.registry,
            started_at: clock.now(),
            clock,
            rng,
            state: Mutex::new(ChainState {
                blocks: vec![genesis],
                contracts: HashMap::new(),
                mempool: Vec::new(),
                receipts: HashMap::new(),
                next_tx_index: 0,
                next_contract_index: 0,
            }),
        })
    }
}

impl Default for TestChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
