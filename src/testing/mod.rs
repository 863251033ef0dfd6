//! Case execution
//!
//! [`CaseTester`] runs one case's fixture/request/verify lifecycle and
//! [`Runner`] drives it over a streamed suite.

mod error;
mod runner;
mod tester;

pub use error::{CaseError, Failure, FailureKind, Phase};
pub use runner::{ErroredCase, RunSummary, Runner};
pub use tester::CaseTester;
