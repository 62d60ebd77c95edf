// File: testing-framework/src/contracts/mod.rs
//
// Contract Runtime
//
// Contracts are stateless code operating on a slot map owned by the chain.
// The chain hands each transaction a scratch copy of the storage and only
// writes it back when the call returns Ok, which gives revert semantics for
// free.

/// The `Why` sample contract
pub mod why;

pub use primitive_types::U256;
pub use why::WhyContract;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Block context visible to contract code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    /// Height of the block executing the call
    pub number: u64,
    /// Timestamp of that block, in seconds
    pub timestamp: u64,
}

/// Contract-level failure; rolls back every write of the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    /// Human readable reason
    pub reason: String,
}

impl Revert {
    /// Revert with `reason`
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Persistent storage of one contract instance
///
/// Unset slots read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractStorage {
    slots: BTreeMap<String, U256>,
}

impl ContractStorage {
    /// Read a slot
    pub fn get(&self, slot: &str) -> U256 {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    /// Write a slot
    pub fn set(&mut self, slot: &str, value: U256) {
        self.slots.insert(slot.to_string(), value);
    }

    /// Number of slots ever written
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot was ever written
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// How a method may be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Changes state; must be sent as a transaction
    Mutator,
    /// Read-only; evaluated without a transaction
    View,
}

/// Executable contract code
pub trait ContractCode: Send + Sync {
    /// Artifact name the factory looks the code up by
    fn name(&self) -> &str;

    /// Kind of `method`, or `None` if the ABI has no such method
    fn method_kind(&self, method: &str) -> Option<MethodKind>;

    /// Runs once in the creation transaction
    fn construct(&self, _storage: &mut ContractStorage, _env: &BlockEnv) -> Result<(), Revert> {
        Ok(())
    }

    /// Execute a mutator
    fn execute(
        &self,
        method: &str,
        storage: &mut ContractStorage,
        env: &BlockEnv,
    ) -> Result<(), Revert>;

    /// Evaluate a view
    fn query(&self, method: &str, storage: &ContractStorage) -> Result<U256, Revert>;
}

/// Compiled artifacts available for deployment, keyed by name
#[derive(Clone, Default)]
pub struct ContractRegistry {
    artifacts: HashMap<String, Arc<dyn ContractCode>>,
}

impl ContractRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled contracts (`Why`)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WhyContract));
        registry
    }

    /// Add or replace an artifact under its own name
    pub fn register(&mut self, code: Arc<dyn ContractCode>) {
        self.artifacts.insert(code.name().to_string(), code);
    }

    /// Look up an artifact
    pub fn get(&self, name: &str) -> Option<Arc<dyn ContractCode>> {
        self.artifacts.get(name).cloned()
    }

    /// Registered artifact names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("artifacts", &self.names())
            .finish()
    }
}
