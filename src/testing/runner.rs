//! Run loop
//!
//! Drains a case source and tests each case in order.

use colored::Colorize;

use crate::cases::CaseSource;
use crate::common::{Error, Result};

use super::error::CaseError;
use super::tester::CaseTester;

/// A case that ended with an error
#[derive(Debug)]
pub struct ErroredCase {
    pub name: String,
    pub error: CaseError,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Cases whose response matched
    pub passed: Vec<String>,
    /// Cases whose response did not match
    pub failed: Vec<String>,
    /// Cases that ended with an error (only when not failing fast)
    pub errored: Vec<ErroredCase>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.errored.len()
    }

    /// True when every case ran to completion without error
    pub fn completed(&self) -> bool {
        self.errored.is_empty()
    }

    /// Print the final tally
    pub fn print(&self) {
        let tally = format!(
            "{} passed, {} failed, {} errored",
            self.passed.len(),
            self.failed.len(),
            self.errored.len()
        );
        if self.failed.is_empty() && self.errored.is_empty() {
            println!("\n{} {}\n", "✓".green().bold(), tally.green().bold());
        } else {
            println!("\n{} {}", "✗".red().bold(), tally.red().bold());
            for errored in &self.errored {
                println!("  {} {}: {}", "✗".red(), errored.name, errored.error);
            }
            println!();
        }
    }
}

/// Drives a [`CaseTester`] over every case of a source
pub struct Runner {
    tester: CaseTester,
    fail_fast: bool,
}

impl Runner {
    pub fn new(tester: CaseTester) -> Self {
        Self {
            tester,
            fail_fast: true,
        }
    }

    /// Stop at the first case error (the default), or record it and go on
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Test every case of `source`
    ///
    /// A decode error from the source always ends the run. A case error
    /// ends it too when failing fast.
    pub async fn run(&self, source: &mut CaseSource) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while let Some(case) = source.next().await? {
            match self.tester.test(&case).await {
                Ok(verdict) if verdict.passed() => summary.passed.push(case.name),
                Ok(_) => summary.failed.push(case.name),
                Err(error) if self.fail_fast => {
                    tracing::error!(case = %case.name, "{}", error);
                    return Err(Error::Case {
                        name: case.name,
                        source: error,
                    });
                }
                Err(error) => {
                    tracing::error!(case = %case.name, "{}", error);
                    summary.errored.push(ErroredCase {
                        name: case.name,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            passed = summary.passed.len(),
            failed = summary.failed.len(),
            errored = summary.errored.len(),
            "Run finished"
        );
        Ok(summary)
    }
}
