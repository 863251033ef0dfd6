//! Verdict reporting

use colored::Colorize;

use super::{Mismatch, Verdict};

/// Receives the verdict of every verified case
pub trait Reporter: Send + Sync {
    fn report(&self, verdict: &Verdict);
}

/// Prints verdicts to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, verdict: &Verdict) {
        if verdict.passed() {
            println!("  {} {} {}", "✓".green(), "PASS".green(), verdict.case);
            return;
        }

        println!("  {} {} {}", "✗".red(), "FAIL".red().bold(), verdict.case);
        for mismatch in &verdict.mismatches {
            print_mismatch(mismatch, self.verbose);
        }
    }
}

fn print_mismatch(mismatch: &Mismatch, verbose: bool) {
    let (expected, actual) = match mismatch {
        Mismatch::Code { expected, actual } => (expected.to_string(), actual.to_string()),
        Mismatch::Body { expected, actual } if verbose => (
            serde_json::to_string_pretty(expected).unwrap_or_else(|_| expected.to_string()),
            serde_json::to_string_pretty(actual).unwrap_or_else(|_| actual.to_string()),
        ),
        Mismatch::Body { expected, actual } => (expected.to_string(), actual.to_string()),
        Mismatch::Header { expected, actual } => (format!("{:?}", expected), format!("{:?}", actual)),
    };

    println!("      - expected {}: {}", mismatch.field(), expected.dimmed());
    println!("      - actual {}:   {}", mismatch.field(), actual.yellow());
}
