// File: testing-framework/tests/why_contract_test.rs
//
// Why Contract Tests
//
// The "Why" suite: a fresh deployment before each case, then
// - randomFail x100, tolerating failed confirmations, expecting at least one
// - worksWell x100, every confirmation required, counter must read 100

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use anyhow::Result;
use why_testing_framework::contracts::why::{INC, ODD_TIMESTAMP_REASON, RANDOM_FAIL, WORKS_WELL};
use why_testing_framework::prelude::*;

const ITERATIONS: u32 = 100;

// beforeEach
async fn deploy_why(env: &DeterministicTestEnv) -> Result<DeployedContract> {
    let chain = TestChainBuilder::new().with_env(env).build();
    ContractFixture::new(chain.connect(), "Why")
        .before_each()
        .await
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Suite: Why
// ============================================================================

#[tokio::test]
async fn should_randomly_fail_on_assigning_block_timestamp_to_a_variable() {
    init_logging();
    let env = DeterministicTestEnv::new_time_paused_or_seed(0x5eed_0001).unwrap();
    let why = deploy_why(&env).await.unwrap();

    let tally = run_tolerant(&why, RANDOM_FAIL, ITERATIONS).await.unwrap();

    if let Err(e) = check_failures_observed(&tally) {
        env.on_failure();
        panic!("{:#}", e);
    }
    check_tally_consistent(&tally, ITERATIONS).unwrap();
    assert!(tally
        .failures()
        .iter()
        .all(|f| f.reverted && f.error.contains(ODD_TIMESTAMP_REASON)));
}

#[tokio::test]
async fn should_not_fail_on_incrementing_a_variable() {
    init_logging();
    let env = DeterministicTestEnv::new_time_paused_or_seed(0x5eed_0002).unwrap();
    let why = deploy_why(&env).await.unwrap();

    if let Err(e) = run_strict(&why, WORKS_WELL, ITERATIONS).await {
        env.on_failure();
        panic!("{:#}", e);
    }

    assert_eq!(why.call_u64(INC).await.unwrap(), 100);
}

// ============================================================================
// Lifecycle and boundaries
// ============================================================================

#[tokio::test]
async fn redeploy_resets_counter() {
    let env = DeterministicTestEnv::new_time_paused_with_seed(3).unwrap();
    let chain = TestChainBuilder::new().with_env(&env).build();
    let fixture = ContractFixture::new(chain.connect(), "Why");

    let first = fixture.before_each().await.unwrap();
    run_strict(&first, WORKS_WELL, 7).await.unwrap();
    assert_eq!(query_counter(&first, INC).await.unwrap(), 7);

    let second = fixture.before_each().await.unwrap();
    assert_ne!(first.address(), second.address());
    assert_eq!(query_counter(&second, INC).await.unwrap(), 0);
    // The old instance is untouched
    assert_eq!(query_counter(&first, INC).await.unwrap(), 7);
}

#[tokio::test]
async fn zero_iterations_leave_counter_at_zero() {
    let env = DeterministicTestEnv::new_time_paused_with_seed(4).unwrap();
    let why = deploy_why(&env).await.unwrap();

    let strict = run_strict(&why, WORKS_WELL, 0).await.unwrap();
    assert_eq!(strict.attempts(), 0);
    assert_eq!(why.call_u64(INC).await.unwrap(), 0);

    let tolerant = run_tolerant(&why, RANDOM_FAIL, 0).await.unwrap();
    assert_eq!(tolerant.attempts(), 0);
    // Nothing was attempted, so the aggregate check does not fire
    check_failures_observed(&tolerant).unwrap();
}

#[tokio::test]
async fn tolerant_loop_survives_any_number_of_failures() {
    let env = DeterministicTestEnv::new_time_paused_with_seed(5).unwrap();
    let why = deploy_why(&env).await.unwrap();

    let tally = run_tolerant(&why, RANDOM_FAIL, ITERATIONS).await.unwrap();
    assert_eq!(tally.attempts(), ITERATIONS);
    assert_eq!(tally.successes() + tally.failure_count(), ITERATIONS);
    assert!(tally.successes() > 0);
}

#[tokio::test]
async fn fixture_setup_failure_aborts_case() {
    let env = DeterministicTestEnv::new_time_paused_with_seed(6).unwrap();
    let chain = TestChainBuilder::new().with_env(&env).build();
    let fixture = ContractFixture::new(chain.connect(), "Missing");

    let err = fixture
        .run_case("never runs", |_contract| async { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChainError>(),
        Some(ChainError::ArtifactNotFound(_))
    ));
}

#[tokio::test]
async fn run_case_deploys_before_body() {
    let env = DeterministicTestEnv::new_time_paused_with_seed(7).unwrap();
    let chain = TestChainBuilder::new().with_env(&env).build();
    let fixture = ContractFixture::new(chain.connect(), "Why");

    let counter = fixture
        .run_case("Should not fail on incrementing a variable", |why| async move {
            run_strict(&why, WORKS_WELL, 10).await?;
            query_counter(&why, INC).await
        })
        .await
        .unwrap();
    assert_eq!(counter, 10);
    // deploy + 10 calls, one block each
    assert_eq!(chain.block_number().await.unwrap(), 11);
}
