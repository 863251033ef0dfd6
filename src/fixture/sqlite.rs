//! SQLite fixture executor

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::common::{Error, Result};

use super::{FixtureError, FixtureExecutor};

/// Fixture executor backed by a single SQLite connection
///
/// Statements run on the blocking pool, one fixture at a time.
#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open (or create) a database file; `:memory:` opens an in-memory database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| Error::Database(format!("Failed to open '{}': {}", path.display(), e)))?;

        tracing::debug!("Opened fixture database {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    /// Wrap an already configured connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a closure against the connection on the blocking pool
    pub async fn with_connection<T, F>(&self, f: F) -> std::result::Result<T, FixtureError>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, FixtureError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| FixtureError::Unavailable("connection lock poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| FixtureError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl FixtureExecutor for SqliteExecutor {
    async fn execute(&self, statements: &[String]) -> std::result::Result<(), FixtureError> {
        if statements.is_empty() {
            return Ok(());
        }

        let statements = statements.to_vec();
        self.with_connection(move |conn| {
            for (index, statement) in statements.iter().enumerate() {
                tracing::trace!("Executing statement {}: {}", index, statement);
                conn.execute_batch(statement)
                    .map_err(|e| FixtureError::statement(index, e.to_string()))?;
            }
            Ok(())
        })
        .await
    }
}
