//! Load harness error taxonomy.

use tokio_postgres::error::SqlState;

/// Errors produced by the bulk-load harness.
///
/// `Setup` wraps opaque host-side failures (branch/table creation, task
/// panics) that occur before or around the copy itself. The remaining
/// variants categorise per-worker failures so callers can distinguish a
/// statement timeout from a rejected ingest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Branch, database, or table creation failed; no workers ran.
    #[error("setup failed: {0}")]
    Setup(anyhow::Error),

    /// A worker could not acquire its connection.
    #[error("connection failed: {0}")]
    Connection(#[source] tokio_postgres::Error),

    /// The bulk copy exceeded the configured statement timeout.
    #[error("statement timeout during copy: {0}")]
    Timeout(#[source] tokio_postgres::Error),

    /// The store rejected or errored during ingest.
    #[error("copy failed: {0}")]
    Copy(#[source] tokio_postgres::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, LoadError>;

impl From<anyhow::Error> for LoadError {
    fn from(e: anyhow::Error) -> Self {
        Self::Setup(e)
    }
}

/// Categorise a driver error raised during the copy phase.
///
/// SQLSTATE 57014 (`query_canceled`) is how the server reports a
/// statement-timeout kill; everything else during ingest is a copy failure.
pub fn classify_copy_error(err: tokio_postgres::Error) -> LoadError {
    match err.code() {
        Some(code) if *code == SqlState::QUERY_CANCELED => LoadError::Timeout(err),
        _ => LoadError::Copy(err),
    }
}

impl LoadError {
    /// Returns `true` for a statement-timeout failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
