//! Concurrent bulk-load harness for PostgreSQL.
//!
//! Runs N workers in parallel, each streaming a deterministic row payload
//! into one shared table via `COPY ... FROM STDIN`, and waits for every
//! worker to finish before reporting the outcome.

pub mod config;
pub mod connect;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod rowgen;
pub mod worker;

// Re-export public API for convenience
pub use config::{parse_scenario, parse_scenario_str, Scenario};
pub use connect::{connect_async, connect_sync, ConnectOptions, DEFAULT_STATEMENT_TIMEOUT};
pub use env::{create_table, Environment, InstanceHandle};
pub use error::LoadError;
pub use orchestrator::{run_load, LoadSummary};
pub use worker::{run_worker, LoadShape, WorkerDescriptor, WorkerReport};
