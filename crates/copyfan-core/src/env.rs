//! Branch environment lifecycle.
//!
//! A "branch" is an isolated database created on a running PostgreSQL
//! server, giving each load scenario its own sandbox. The environment is
//! an owned value with an explicit create/teardown lifecycle; nothing here
//! is ambient or process-global.

use anyhow::Context;

use crate::connect::{connect_sync, ConnectOptions};
use crate::error::{LoadError, Result};

/// An isolated branch database on a running server.
pub struct Environment {
    server: ConnectOptions,
    branch: String,
}

/// Connection options scoped to one branch database.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    options: ConnectOptions,
}

impl InstanceHandle {
    /// Handle for a database that already exists (no branch lifecycle).
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

impl Environment {
    /// Create a branch database named `branch` on the server that
    /// `server_options` points at.
    pub fn create(server_options: &ConnectOptions, branch: &str) -> Result<Self> {
        validate_identifier(branch)?;

        let mut client = connect_sync(server_options)?;
        client
            .batch_execute(&format!("CREATE DATABASE {branch}"))
            .with_context(|| format!("failed to create branch database {branch}"))
            .map_err(LoadError::Setup)?;

        tracing::info!(branch, "created branch database");
        Ok(Self {
            server: server_options.clone(),
            branch: branch.to_string(),
        })
    }

    /// Handle for connecting to this branch.
    pub fn instance(&self) -> InstanceHandle {
        InstanceHandle {
            options: self.server.with_database(&self.branch),
        }
    }

    pub fn branch_name(&self) -> &str {
        &self.branch
    }

    /// Drop the branch database. Consumes the environment; any remaining
    /// connections into the branch must be closed first.
    pub fn teardown(self) -> Result<()> {
        let mut client = connect_sync(&self.server)?;
        client
            .batch_execute(&format!(
                "DROP DATABASE IF EXISTS {} WITH (FORCE)",
                self.branch
            ))
            .with_context(|| format!("failed to drop branch database {}", self.branch))
            .map_err(LoadError::Setup)?;
        tracing::info!(branch = self.branch, "dropped branch database");
        Ok(())
    }
}

/// Create the shared target table over a blocking connection, before any
/// worker starts.
pub fn create_table(instance: &InstanceHandle, table: &str, columns_sql: &str) -> Result<()> {
    validate_identifier(table)?;

    let mut client = connect_sync(instance.options())?;
    client
        .batch_execute(&format!("CREATE TABLE {table} ({columns_sql})"))
        .with_context(|| format!("failed to create table {table}"))
        .map_err(LoadError::Setup)?;
    tracing::info!(table, "created target table");
    Ok(())
}

/// Table and branch names are interpolated into DDL, so restrict them to
/// plain identifiers.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(LoadError::Setup(anyhow::anyhow!(
            "invalid identifier: {name:?}"
        )))
    }
}
