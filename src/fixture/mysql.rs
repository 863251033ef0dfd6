//! MySQL fixture executor

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{OptsBuilder, Pool};

use crate::common::{Error, Result};

use super::{FixtureError, FixtureExecutor};

const DEFAULT_PORT: u16 = 3306;

/// Fixture executor backed by a MySQL connection pool
///
/// Each fixture runs on one connection taken from the pool. Connections are
/// opened on first use.
pub struct MySqlExecutor {
    pool: Pool,
}

impl MySqlExecutor {
    /// Create an executor for the server at `address` (`host` or `host:port`)
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(address: &str, user: &str, password: &str, db_name: Option<&str>) -> Result<Self> {
        let (host, port) = split_address(address)?;

        let opts = OptsBuilder::default()
            .ip_or_hostname(host)
            .tcp_port(port)
            .user(Some(user))
            .pass(Some(password))
            .db_name(db_name);

        tracing::debug!("MySQL fixture database at {}:{}", host, port);
        Ok(Self {
            pool: Pool::new(opts),
        })
    }
}

/// Split `host:port`, defaulting the port
fn split_address(address: &str) -> Result<(&str, u16)> {
    let address = address.trim();
    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid database port in '{}'", address)))?;
            Ok((host, port))
        }
        None => Ok((address, DEFAULT_PORT)),
    }
}

#[async_trait]
impl FixtureExecutor for MySqlExecutor {
    async fn execute(&self, statements: &[String]) -> std::result::Result<(), FixtureError> {
        if statements.is_empty() {
            return Ok(());
        }

        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| FixtureError::Unavailable(e.to_string()))?;

        for (index, statement) in statements.iter().enumerate() {
            tracing::trace!("Executing statement {}: {}", index, statement);
            conn.query_drop(statement.as_str())
                .await
                .map_err(|e| FixtureError::statement(index, e.to_string()))?;
        }
        Ok(())
    }
}
