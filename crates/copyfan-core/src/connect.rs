//! PostgreSQL connection factory.
//!
//! Every load worker gets its own async connection; setup-time DDL goes
//! through a blocking connection so table creation finishes before any
//! worker starts.

use std::time::Duration;

use serde::Deserialize;
use tokio_postgres::{Client, NoTls};

use crate::error::{LoadError, Result};

/// Default per-connection statement timeout applied by the factory.
/// Large bulk transfers must override this before starting the copy.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(120);

/// PostgreSQL connection options.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

fn default_port() -> u16 {
    5432
}

impl ConnectOptions {
    /// libpq-style keyword connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.database
        )
    }

    /// Same options pointed at a different database on the same server.
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..self.clone()
        }
    }
}

/// Open an async connection and spawn its driver task.
///
/// The factory applies [`DEFAULT_STATEMENT_TIMEOUT`] to the session, so a
/// runaway statement is killed after 2 minutes unless the caller raises the
/// limit first.
pub async fn connect_async(options: &ConnectOptions) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(&options.connection_string(), NoTls)
        .await
        .map_err(LoadError::Connection)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!("postgres connection error: {e}");
        }
    });

    client
        .batch_execute(&format!(
            "SET statement_timeout = '{}s'",
            DEFAULT_STATEMENT_TIMEOUT.as_secs()
        ))
        .await
        .map_err(LoadError::Connection)?;

    Ok(client)
}

/// Open a blocking connection for setup-time DDL.
///
/// The sync `postgres` crate manages its own internal runtime, so this
/// works from any thread.
pub fn connect_sync(options: &ConnectOptions) -> Result<postgres::Client> {
    postgres::Client::connect(&options.connection_string(), NoTls)
        .map_err(LoadError::Connection)
}
