// File: testing-framework/src/utilities/replay.rs
//
// Artifact Replay Utilities
//
// Turn a saved failure artifact back into something actionable: a summary
// and the command that reruns the case with the same seed.

use super::artifacts::{ArtifactCollector, TestArtifact};
use crate::orchestrator::rng::SEED_ENV_VAR;
use anyhow::{bail, Result};
use std::path::Path;

/// Load artifact from disk
pub async fn load_artifact(filepath: impl AsRef<Path>) -> Result<TestArtifact> {
    ArtifactCollector::load(filepath).await
}

/// Example binary that reruns a suite file, seeding from `WHY_TEST_SEED`
pub const SUITE_RUNNER: &str = "why_suite_demo";

/// Command line that replays the failed case
///
/// Suite artifacts rerun their suite file through the suite runner; other
/// artifacts rerun the named test. Without a recorded seed the rerun picks
/// a fresh one.
pub fn get_replay_command(artifact: &TestArtifact) -> String {
    let metadata = &artifact.metadata;
    let rerun = match (&metadata.suite_file, &metadata.suite_name) {
        (Some(file), _) => format!("cargo run --example {} -- \"{}\"", SUITE_RUNNER, file),
        (None, Some(suite)) => format!(
            "cargo run --example {} -- <file defining suite \"{}\">",
            SUITE_RUNNER, suite
        ),
        (None, None) => format!("cargo test -- --exact \"{}\"", metadata.test_name),
    };

    match metadata.rng_seed {
        Some(seed) => format!("{}=0x{:016x} {}", SEED_ENV_VAR, seed, rerun),
        None => rerun,
    }
}

/// Reject artifacts that cannot describe a failure
pub fn validate_artifact(artifact: &TestArtifact) -> Result<()> {
    if artifact.metadata.test_name.is_empty() {
        bail!("Artifact has no test name");
    }
    if artifact.metadata.failure_reason.is_none() {
        bail!(
            "Artifact for '{}' records no failure reason",
            artifact.metadata.test_name
        );
    }
    Ok(())
}

/// Print a human-readable summary to stdout
pub fn print_artifact_summary(artifact: &TestArtifact) {
    let rule = "=".repeat(66);
    println!("{}", rule);
    println!(" TEST FAILURE ARTIFACT");
    println!("{}", rule);
    println!(" Test:       {}", artifact.metadata.test_name);
    if let Some(ref suite) = artifact.metadata.suite_name {
        println!(" Suite:      {}", suite);
    }
    println!(" Timestamp:  {}", artifact.metadata.timestamp);
    println!(" Duration:   {} ms", artifact.metadata.duration_ms);
    match artifact.metadata.rng_seed {
        Some(seed) => println!(" RNG Seed:   0x{:016x}", seed),
        None => println!(" RNG Seed:   N/A"),
    }
    if let Some(ref contract) = artifact.contract {
        println!(" Contract:   {} at {}", contract.name, contract.address);
    }

    if let Some(ref reason) = artifact.metadata.failure_reason {
        println!("{}", rule);
        println!(" FAILURE REASON:");
        for line in textwrap::wrap(reason, 62) {
            println!("   {}", line);
        }
    }

    println!("{}", rule);
    println!(
        " Failed transactions: {} (reverted: {})",
        artifact.transactions.len(),
        artifact.transactions.iter().filter(|tx| tx.reverted).count()
    );
    for tx in artifact.transactions.iter().take(5) {
        println!("   #{} {} {}", tx.iteration, tx.method, tx.error);
    }

    if !artifact.logs.is_empty() {
        println!("{}", rule);
        println!(" RECENT LOGS (last 5):");
        for entry in artifact.logs.iter().rev().take(5).rev() {
            println!("   [{}] {}", entry.level, entry.message);
        }
    }

    println!("{}", rule);
    println!(" Replay: {}", get_replay_command(artifact));
}
