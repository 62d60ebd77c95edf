//! YAML suite parser

use crate::harness::FailurePolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// A named group of cases run against one contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Optional free text
    #[serde(default)]
    pub description: Option<String>,
    /// Artifact deployed before each case
    pub contract: String,
    /// Cases, run in file order
    pub cases: Vec<TestCase>,
}

/// One case: a method invoked in a loop under a failure policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Case name
    pub name: String,
    /// Mutator invoked each iteration
    pub method: String,
    /// Loop bound
    pub iterations: u32,
    /// Failed-confirmation handling
    pub policy: FailurePolicy,
    /// Post-conditions
    #[serde(default)]
    pub expect: CaseExpect,
}

/// Post-conditions checked once after the loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseExpect {
    /// Expected failed confirmations
    #[serde(default)]
    pub failures: FailureExpect,
    /// Read-only query compared after the loop
    #[serde(default)]
    pub query: Option<QueryExpect>,
}

/// Expected number of failed confirmations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureExpect {
    /// At least one (skipped when the loop is empty)
    AtLeastOne,
    /// None at all
    None,
    /// Not checked
    #[default]
    Any,
}

/// `method() == eq`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryExpect {
    /// View to call
    pub method: String,
    /// Expected value
    pub eq: u64,
}

/// Parse and validate a suite
///
/// # Errors
///
/// Returns error if the YAML is malformed or the suite is inconsistent:
/// no cases, duplicate case names, or a strict case expecting failures
/// (a strict loop aborts on its first failure).
pub fn parse_suite(yaml: &str) -> Result<TestSuite> {
    let suite: TestSuite = serde_yaml::from_str(yaml).context("Failed to parse suite YAML")?;
    validate_suite(&suite)?;
    Ok(suite)
}

/// Read and parse a suite file
pub async fn load_suite(path: impl AsRef<std::path::Path>) -> Result<TestSuite> {
    let path = path.as_ref();
    let yaml = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read suite {}", path.display()))?;
    parse_suite(&yaml).with_context(|| format!("Invalid suite {}", path.display()))
}

fn validate_suite(suite: &TestSuite) -> Result<()> {
    if suite.cases.is_empty() {
        bail!("Suite '{}' has no cases", suite.name);
    }

    let mut seen = std::collections::HashSet::new();
    for case in &suite.cases {
        if !seen.insert(case.name.as_str()) {
            bail!("Duplicate case name '{}'", case.name);
        }
        if case.policy == FailurePolicy::Strict && case.expect.failures == FailureExpect::AtLeastOne
        {
            bail!(
                "Case '{}' is strict but expects at least one failure",
                case.name
            );
        }
    }
    Ok(())
}
