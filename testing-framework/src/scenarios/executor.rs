//! Suite execution engine
//!
//! Runs each case of a parsed suite against its own fresh deployment and
//! collects a report. A failing case never stops the suite.
//!
//! # Example
//!
//! ```rust,ignore
//! use why_testing_framework::scenarios::{parse_suite, SuiteExecutor};
//!
//! let suite = parse_suite(include_str!("../../tests/fixtures/why_suite.yaml"))?;
//! let chain = TestChainBuilder::new().with_seed(0xa3f5).build();
//! let mut executor = SuiteExecutor::new(chain.connect()).with_seed(chain.seed());
//! let report = executor.execute(&suite).await?;
//!
//! assert!(report.passed());
//! ```

use super::parser::{FailureExpect, TestCase, TestSuite};
use crate::chain::Address;
use crate::harness::{
    query_counter, run_with_policy, Connection, ContractFixture, FailureTally, StrictAbort,
};
use crate::invariants::{check_counter_matches, check_failures_observed, check_no_failures};
use crate::utilities::ArtifactCollector;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    /// Case name
    pub name: String,
    /// Whether setup, loop and every expectation passed
    pub passed: bool,
    /// Address of the instance deployed for this case
    pub contract: Option<Address>,
    /// Loop outcomes (empty if setup failed; up to the failing iteration if
    /// a strict loop aborted)
    pub tally: FailureTally,
    /// Value returned by the expectation query, if one ran
    pub query_value: Option<u64>,
    /// Full error chain of the failure
    pub failure_reason: Option<String>,
    /// Failure artifact written for this case
    pub artifact: Option<PathBuf>,
}

impl CaseReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            contract: None,
            tally: FailureTally::new(),
            query_value: None,
            failure_reason: None,
            artifact: None,
        }
    }
}

/// Outcome of a whole suite
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Seed the chain ran with, when known
    pub seed: Option<u64>,
    /// Per-case results in execution order
    pub cases: Vec<CaseReport>,
    /// Execution log
    pub log: Vec<String>,
}

impl SuiteReport {
    /// Whether every case passed
    pub fn passed(&self) -> bool {
        self.cases.iter().all(|case| case.passed)
    }

    /// Look a case up by name
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.name == name)
    }
}

/// Runs parsed suites through a harness connection
pub struct SuiteExecutor {
    connection: Connection,
    seed: Option<u64>,
    artifact_dir: Option<PathBuf>,
    suite_file: Option<PathBuf>,
    log: Vec<String>,
}

impl SuiteExecutor {
    /// Executor without artifact output
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            seed: None,
            artifact_dir: None,
            suite_file: None,
            log: Vec::new(),
        }
    }

    /// Seed to record in reports and artifacts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Write a JSON artifact for every failing case into `dir`
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// File the suite was loaded from; artifacts replay through it
    pub fn with_suite_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.suite_file = Some(path.into());
        self
    }

    /// Execute every case of `suite`
    ///
    /// # Errors
    ///
    /// Case failures are reported, not returned. An error here means the
    /// executor itself could not run.
    pub async fn execute(&mut self, suite: &TestSuite) -> Result<SuiteReport> {
        self.log.clear();
        self.log(format!("Starting suite: {}", suite.name));
        if let Some(desc) = &suite.description {
            self.log(format!("Description: {}", desc));
        }

        let fixture = ContractFixture::new(self.connection.clone(), suite.contract.clone());
        let mut cases = Vec::with_capacity(suite.cases.len());

        for case in &suite.cases {
            self.log(format!("--- Case: {} ---", case.name));
            let report = self.execute_case(suite, &fixture, case).await;
            if report.passed {
                self.log(format!("PASS {}", case.name));
            } else {
                self.log(format!(
                    "FAIL {}: {}",
                    case.name,
                    report.failure_reason.as_deref().unwrap_or("unknown")
                ));
            }
            cases.push(report);
        }

        let passed = cases.iter().filter(|c| c.passed).count();
        self.log(format!(
            "Suite '{}' finished: {}/{} passed",
            suite.name,
            passed,
            cases.len()
        ));

        Ok(SuiteReport {
            suite_name: suite.name.clone(),
            seed: self.seed,
            cases,
            log: self.log.clone(),
        })
    }

    async fn execute_case(
        &mut self,
        suite: &TestSuite,
        fixture: &ContractFixture,
        case: &TestCase,
    ) -> CaseReport {
        let mut report = CaseReport::new(&case.name);
        let started = std::time::Instant::now();

        match Self::run_case(fixture, case, &mut report).await {
            Ok(()) => report.passed = true,
            Err(e) => {
                let reason = format!("{:#}", e);
                log::error!("Case '{}' failed: {}", case.name, reason);
                report.failure_reason = Some(reason);

                if let Some(dir) = self.artifact_dir.clone() {
                    let mut collector = ArtifactCollector::new(&case.name);
                    collector.set_suite_name(&suite.name);
                    if let Some(file) = &self.suite_file {
                        collector.set_suite_file(file);
                    }
                    if let Some(seed) = self.seed {
                        collector.set_rng_seed(seed);
                    }
                    if let Some(address) = report.contract {
                        collector.set_contract(&suite.contract, address);
                    }
                    collector.add_failures(&case.method, &report.tally);
                    collector.set_failure_reason(report.failure_reason.clone().unwrap_or_default());
                    for line in &self.log {
                        collector.capture_log("INFO", line.clone());
                    }
                    collector.set_duration(started.elapsed());

                    match collector.save(&dir).await {
                        Ok(path) => {
                            self.log(format!("Artifact saved to {}", path.display()));
                            report.artifact = Some(path);
                        }
                        Err(e) => log::warn!("Could not save artifact for '{}': {:#}", case.name, e),
                    }
                }
            }
        }

        report
    }

    async fn run_case(
        fixture: &ContractFixture,
        case: &TestCase,
        report: &mut CaseReport,
    ) -> Result<()> {
        let contract = fixture.before_each().await?;
        report.contract = Some(contract.address());

        report.tally =
            match run_with_policy(&contract, &case.method, case.iterations, case.policy).await {
                Ok(tally) => tally,
                Err(e) => {
                    if let Some(abort) = e.downcast_ref::<StrictAbort>() {
                        report.tally = abort.tally.clone();
                    }
                    return Err(e);
                }
            };

        match case.expect.failures {
            FailureExpect::AtLeastOne => check_failures_observed(&report.tally)?,
            FailureExpect::None => check_no_failures(&report.tally)?,
            FailureExpect::Any => {}
        }

        if let Some(query) = &case.expect.query {
            let value = query_counter(&contract, &query.method).await?;
            report.query_value = Some(value);
            check_counter_matches(value, query.eq)?;
        }

        Ok(())
    }

    fn log(&mut self, msg: String) {
        log::info!("{}", msg);
        self.log.push(msg);
    }
}
