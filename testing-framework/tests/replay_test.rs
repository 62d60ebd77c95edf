#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Seed replay
//!
//! A failing suite case saves an artifact; rerunning the recorded suite file
//! with `WHY_TEST_SEED` set to the recorded seed must fail the same way.
//! Kept in its own test binary because it sets process environment.

use why_testing_framework::orchestrator::rng::SEED_ENV_VAR;
use why_testing_framework::orchestrator::DeterministicTestEnv;
use why_testing_framework::scenarios::{load_suite, SuiteExecutor, SuiteReport};
use why_testing_framework::utilities::{get_replay_command, load_artifact, validate_artifact};
use why_testing_framework::TestChainBuilder;

const FLAKY_CASE: &str = "randomFail is expected never to fail";

const FLAKY_SUITE: &str = r#"
name: "Why flaky"
contract: "Why"
cases:
  - name: "warm up"
    method: "worksWell"
    iterations: 3
    policy: strict
  - name: "randomFail is expected never to fail"
    method: "randomFail"
    iterations: 60
    policy: tolerant
    expect:
      failures: none
"#;

async fn run_suite(
    env: &DeterministicTestEnv,
    suite_file: &std::path::Path,
    artifact_dir: &std::path::Path,
) -> SuiteReport {
    let suite = load_suite(suite_file).await.unwrap();
    let chain = TestChainBuilder::new().with_env(env).build();
    SuiteExecutor::new(chain.connect())
        .with_seed(env.seed())
        .with_suite_file(suite_file)
        .with_artifact_dir(artifact_dir)
        .execute(&suite)
        .await
        .unwrap()
}

#[tokio::test]
async fn replaying_recorded_seed_reproduces_failures() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let suite_file = dir.path().join("flaky.yaml");
    tokio::fs::write(&suite_file, FLAKY_SUITE).await.unwrap();

    // Original run: seed picked from the environment, as the suite runner does
    std::env::set_var(SEED_ENV_VAR, "0xc0ffee");
    let env = DeterministicTestEnv::new_time_paused().unwrap();
    assert_eq!(env.seed(), 0xc0ffee);
    let original = run_suite(&env, &suite_file, &dir.path().join("first")).await;

    let failed = original.case(FLAKY_CASE).unwrap();
    assert!(!failed.passed);
    assert!(failed.tally.failure_count() > 0);

    let artifact = load_artifact(failed.artifact.as_ref().unwrap())
        .await
        .unwrap();
    validate_artifact(&artifact).unwrap();
    let recorded_file = artifact.metadata.suite_file.clone().unwrap();
    assert_eq!(recorded_file, suite_file.display().to_string());

    let command = get_replay_command(&artifact);
    assert_eq!(
        command,
        format!(
            "WHY_TEST_SEED=0x0000000000c0ffee cargo run --example why_suite_demo -- \"{}\"",
            recorded_file
        )
    );

    // Replay: the seed reaches the chain only through the environment
    let seed = artifact.metadata.rng_seed.unwrap();
    std::env::set_var(SEED_ENV_VAR, format!("0x{:016x}", seed));
    let replay_env = DeterministicTestEnv::new_time_paused().unwrap();
    std::env::remove_var(SEED_ENV_VAR);
    assert_eq!(replay_env.seed(), seed);

    let replayed = run_suite(
        &replay_env,
        std::path::Path::new(&recorded_file),
        &dir.path().join("second"),
    )
    .await;
    let again = replayed.case(FLAKY_CASE).unwrap();
    assert!(!again.passed);
    assert_eq!(again.tally, failed.tally);

    let replay_artifact = load_artifact(again.artifact.as_ref().unwrap())
        .await
        .unwrap();
    let iterations = |a: &why_testing_framework::utilities::TestArtifact| {
        a.transactions.iter().map(|tx| tx.iteration).collect::<Vec<_>>()
    };
    assert_eq!(iterations(&replay_artifact), iterations(&artifact));
}

#[tokio::test]
async fn different_seed_changes_failures() {
    let dir = tempfile::tempdir().unwrap();
    let suite_file = dir.path().join("flaky.yaml");
    tokio::fs::write(&suite_file, FLAKY_SUITE).await.unwrap();

    let first = DeterministicTestEnv::new_time_paused_with_seed(1).unwrap();
    let second = DeterministicTestEnv::new_time_paused_with_seed(2).unwrap();
    let a = run_suite(&first, &suite_file, dir.path()).await;
    let b = run_suite(&second, &suite_file, dir.path()).await;

    assert_ne!(
        a.case(FLAKY_CASE).unwrap().tally,
        b.case(FLAKY_CASE).unwrap().tally
    );
}
