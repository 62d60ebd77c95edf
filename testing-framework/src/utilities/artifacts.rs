// File: testing-framework/src/utilities/artifacts.rs
//
// Failure Artifact Collection
//
// When a case fails, everything needed to understand and replay it (seed,
// contract, failed transactions, execution log) is written to one JSON file.

use crate::chain::Address;
use crate::harness::FailureTally;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Contract instance the case ran against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    /// Artifact name
    pub name: String,
    /// Deployed address
    pub address: String,
}

/// A failed confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash
    pub hash: String,
    /// Called method
    pub method: String,
    /// Loop iteration
    pub iteration: u32,
    /// Rendered error
    pub error: String,
    /// Whether the chain reported a revert
    pub reverted: bool,
}

/// Test metadata for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMetadata {
    /// Case name
    pub test_name: String,
    /// Enclosing suite, if any
    pub suite_name: Option<String>,
    /// YAML file the suite was loaded from
    #[serde(default)]
    pub suite_file: Option<String>,
    /// RNG seed the chain ran with
    pub rng_seed: Option<u64>,
    /// When the artifact was created (RFC 3339)
    pub timestamp: String,
    /// Case duration in milliseconds
    pub duration_ms: u64,
    /// Failure reason
    pub failure_reason: Option<String>,
}

/// Log entry captured during the case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub level: String,
    /// Log message
    pub message: String,
    /// Timestamp (RFC 3339)
    pub timestamp: String,
}

/// Complete failure artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestArtifact {
    /// Test metadata
    pub metadata: TestMetadata,
    /// Contract instance, if setup got that far
    pub contract: Option<ContractSnapshot>,
    /// Failed confirmations in loop order
    pub transactions: Vec<TransactionRecord>,
    /// Captured logs
    pub logs: Vec<LogEntry>,
}

/// Builds a `TestArtifact` and writes it to disk
///
/// # Examples
///
/// ```rust,ignore
/// let mut collector = ArtifactCollector::new("Should not fail on incrementing a variable");
/// collector.set_rng_seed(chain.seed());
/// collector.set_failure_reason(format!("{:#}", err));
/// let path = collector.save("./artifacts/").await?;
/// ```
pub struct ArtifactCollector {
    metadata: TestMetadata,
    contract: Option<ContractSnapshot>,
    transactions: Vec<TransactionRecord>,
    logs: Vec<LogEntry>,
    start_time: std::time::Instant,
}

impl ArtifactCollector {
    /// Start collecting for `test_name`
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            metadata: TestMetadata {
                test_name: test_name.into(),
                suite_name: None,
                suite_file: None,
                rng_seed: None,
                timestamp: chrono::Utc::now().to_rfc3339(),
                duration_ms: 0,
                failure_reason: None,
            },
            contract: None,
            transactions: Vec::new(),
            logs: Vec::new(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Enclosing suite
    pub fn set_suite_name(&mut self, suite_name: impl Into<String>) {
        self.metadata.suite_name = Some(suite_name.into());
    }

    /// Suite file to rerun on replay
    pub fn set_suite_file(&mut self, path: impl AsRef<Path>) {
        self.metadata.suite_file = Some(path.as_ref().display().to_string());
    }

    /// RNG seed used in the test
    pub fn set_rng_seed(&mut self, seed: u64) {
        self.metadata.rng_seed = Some(seed);
    }

    /// Failure reason
    pub fn set_failure_reason(&mut self, reason: impl Into<String>) {
        self.metadata.failure_reason = Some(reason.into());
    }

    /// Override the measured duration
    pub fn set_duration(&mut self, duration: Duration) {
        self.metadata.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }

    /// Contract instance under test
    pub fn set_contract(&mut self, name: impl Into<String>, address: Address) {
        self.contract = Some(ContractSnapshot {
            name: name.into(),
            address: address.to_string(),
        });
    }

    /// Record every failure of a tally
    pub fn add_failures(&mut self, method: &str, tally: &FailureTally) {
        self.transactions
            .extend(tally.failures().iter().map(|failure| TransactionRecord {
                hash: failure.tx_hash.to_string(),
                method: method.to_string(),
                iteration: failure.iteration,
                error: failure.error.clone(),
                reverted: failure.reverted,
            }));
    }

    /// Capture a log entry
    pub fn capture_log(&mut self, level: impl Into<String>, message: impl Into<String>) {
        self.logs.push(LogEntry {
            level: level.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Snapshot of everything collected so far
    pub fn build(&self) -> TestArtifact {
        let mut metadata = self.metadata.clone();
        if metadata.duration_ms == 0 {
            metadata.duration_ms =
                u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        }
        TestArtifact {
            metadata,
            contract: self.contract.clone(),
            transactions: self.transactions.clone(),
            logs: self.logs.clone(),
        }
    }

    /// Write the artifact as pretty JSON into `output_dir`
    ///
    /// The file name combines the sanitized test name and a timestamp.
    ///
    /// # Returns
    ///
    /// Path of the written file
    pub async fn save(&self, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let filename = format!(
            "{}_{}.json",
            sanitize(&self.metadata.test_name),
            chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = output_dir.join(filename);

        let json = serde_json::to_string_pretty(&self.build())
            .context("Failed to serialize artifact")?;
        let mut file = fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write artifact")?;
        file.flush().await.context("Failed to flush artifact")?;

        log::info!("Failure artifact saved to {}", path.display());
        Ok(path)
    }

    /// Read an artifact back
    pub async fn load(filepath: impl AsRef<Path>) -> Result<TestArtifact> {
        let filepath = filepath.as_ref();
        let json = fs::read_to_string(filepath)
            .await
            .with_context(|| format!("Failed to read {}", filepath.display()))?;
        serde_json::from_str(&json).context("Failed to parse artifact JSON")
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    cleaned.chars().take(80).collect()
}
