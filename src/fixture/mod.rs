//! Fixture execution
//!
//! A fixture is an ordered list of SQL statements run before (set up) or
//! after (tear down) a case. Executors stop at the first failing statement
//! and make no rollback promise.

mod mysql;
mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

pub use mysql::MySqlExecutor;
pub use sqlite::SqliteExecutor;

/// Failure while executing a fixture
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    #[error("error executing statement {index}: {message}")]
    Statement { index: usize, message: String },

    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl FixtureError {
    /// Create a statement failure for the statement at `index`
    pub fn statement(index: usize, message: impl Into<String>) -> Self {
        Self::Statement {
            index,
            message: message.into(),
        }
    }
}

/// Runs fixture statements against a database
#[async_trait]
pub trait FixtureExecutor: Send + Sync {
    /// Execute `statements` in order, stopping at the first failure
    async fn execute(&self, statements: &[String]) -> Result<(), FixtureError>;
}
