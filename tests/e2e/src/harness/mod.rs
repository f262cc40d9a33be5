
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use copyfan_core::connect::ConnectOptions;
use copyfan_core::env::{create_table, Environment, InstanceHandle};
use tokio_postgres::NoTls;

static NEXT_BRANCH_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to the shared test server.
#[derive(Debug, Clone)]
pub struct TestServer {
    pub options: ConnectOptions,
}

/// Start (or reuse) the shared PostgreSQL container and return server-level
/// connection options.
pub async fn bootstrap() -> Result<TestServer> {
    let port = tokio::task::spawn_blocking(container::shared_postgres_port)
        .await
        .context("container bootstrap task panicked")??;

    Ok(TestServer {
        options: ConnectOptions {
            host: "127.0.0.1".to_string(),
            port,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "postgres".to_string(),
        },
    })
}

impl TestServer {
    /// Create an isolated branch database named after the test.
    pub async fn create_branch(&self, test_name: &str) -> Result<Environment> {
        let branch_id = NEXT_BRANCH_ID.fetch_add(1, Ordering::Relaxed);
        let branch = format!("{}_{}", sanitize_identifier(test_name), branch_id);
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || Environment::create(&options, &branch))
            .await
            .context("branch creation task panicked")?
            .with_context(|| format!("failed to create branch for {test_name}"))
    }
}

/// Create the reference target table (`i int, t text`) on a branch.
pub async fn create_copytest_table(instance: &InstanceHandle, table: &str) -> Result<()> {
    let instance = instance.clone();
    let table = table.to_string();
    let table_for_task = table.clone();
    tokio::task::spawn_blocking(move || create_table(&instance, &table_for_task, "i int, t text"))
        .await
        .context("table creation task panicked")?
        .with_context(|| format!("failed to create table {table}"))
}

/// Drop a branch database once all its connections are closed.
pub async fn teardown(env: Environment) -> Result<()> {
    tokio::task::spawn_blocking(move || env.teardown())
        .await
        .context("teardown task panicked")?
        .context("failed to tear down branch")
}

/// Total row count in a branch table.
pub async fn table_row_count(instance: &InstanceHandle, table: &str) -> Result<i64> {
    let client = connect(instance).await?;
    let row = client
        .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await
        .with_context(|| format!("failed to count rows in {table}"))?;
    Ok(row.get::<_, i64>(0))
}

/// Raw async connection into a branch, for test-side SQL.
pub async fn connect(instance: &InstanceHandle) -> Result<tokio_postgres::Client> {
    let (client, connection) =
        tokio_postgres::connect(&instance.options().connection_string(), NoTls)
            .await
            .context("failed to connect to postgres")?;

    tokio::spawn(async move {
        let _ = connection.await;
    });

    Ok(client)
}

fn sanitize_identifier(input: &str) -> String {
    input
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
