//! casetest - declarative end-to-end test runner
//!
//! A suite is a JSON array of cases. Each case carries SQL fixtures, a request
//! and the expected response. Cases are decoded while the suite runs and
//! every case is torn down whatever happened to it.

pub mod cases;
pub mod cli;
pub mod commands;
pub mod common;
pub mod fixture;
pub mod http;
pub mod testing;
pub mod verify;

// Re-export commonly used types for tests
pub use cases::{Case, CaseSource};
pub use common::{Error, Result};
pub use testing::{CaseError, CaseTester, FailureKind, RunSummary, Runner};
