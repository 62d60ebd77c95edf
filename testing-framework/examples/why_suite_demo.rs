//! Why Suite Runner
//!
//! Runs a suite file (the bundled Why suite by default) against the
//! in-process chain on paused time and prints the report. The seed comes
//! from `WHY_TEST_SEED` when set, so the replay command printed for a
//! failing case reruns it exactly.
//!
//! Run with: RUST_LOG=info cargo run --example why_suite_demo -- [suite.yaml]

use anyhow::Result;
use why_testing_framework::orchestrator::DeterministicTestEnv;
use why_testing_framework::scenarios::{load_suite, SuiteExecutor};
use why_testing_framework::utilities::{load_artifact, print_artifact_summary};
use why_testing_framework::TestChainBuilder;

const BUNDLED_SUITE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/why_suite.yaml");

// Paused time needs a current-thread runtime
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let suite_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| BUNDLED_SUITE.to_string());
    let suite = load_suite(&suite_file).await?;

    let env = DeterministicTestEnv::new_time_paused()?;
    let chain = TestChainBuilder::new().with_env(&env).build();

    let artifact_dir = std::env::temp_dir().join("why-artifacts");
    let mut executor = SuiteExecutor::new(chain.connect())
        .with_seed(env.seed())
        .with_suite_file(&suite_file)
        .with_artifact_dir(&artifact_dir);

    let report = executor.execute(&suite).await?;

    println!("Suite: {} (seed 0x{:016x})", report.suite_name, env.seed());
    for case in &report.cases {
        println!(
            "  [{}] {} - {} confirmed, {} failed",
            if case.passed { "PASS" } else { "FAIL" },
            case.name,
            case.tally.successes(),
            case.tally.failure_count()
        );
        if let Some(path) = &case.artifact {
            print_artifact_summary(&load_artifact(path).await?);
        }
    }

    if !report.passed() {
        anyhow::bail!("suite '{}' failed", report.suite_name);
    }
    Ok(())
}
