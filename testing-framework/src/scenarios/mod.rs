//! YAML suite DSL
//!
//! A suite names one contract and lists cases; every case runs against a
//! fresh deployment.
//!
//! ## Example Suite
//!
//! ```yaml
//! name: "Why"
//! contract: "Why"
//! cases:
//!   - name: "Should randomly fail on assigning block.timestamp to a variable"
//!     method: "randomFail"
//!     iterations: 100
//!     policy: tolerant
//!     expect:
//!       failures: at_least_one
//!   - name: "Should not fail on incrementing a variable"
//!     method: "worksWell"
//!     iterations: 100
//!     policy: strict
//!     expect:
//!       query:
//!         method: "inc"
//!         eq: 100
//! ```

/// Suite execution engine
pub mod executor;
/// Suite YAML parser
pub mod parser;

pub use executor::{CaseReport, SuiteExecutor, SuiteReport};
pub use parser::{load_suite, parse_suite, CaseExpect, FailureExpect, QueryExpect, TestCase, TestSuite};
