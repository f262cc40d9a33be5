//! Load worker: one dedicated connection driving one bulk copy.

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::connect::{connect_async, ConnectOptions};
use crate::env::validate_identifier;
use crate::error::{classify_copy_error, Result};
use crate::rowgen::{render_rows, repeat_buffer};

/// Shape of one worker's transfer.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadShape {
    /// Rows rendered into the page buffer.
    #[serde(default = "default_rows_per_buffer")]
    pub rows_per_buffer: u32,
    /// Times the page buffer is streamed to the server.
    #[serde(default = "default_repetitions")]
    pub repetitions: u64,
    /// Per-connection statement timeout for the copy. The factory default
    /// of 2 minutes is not enough for the reference transfer on a slow
    /// system in debug mode, so the worker raises it before copying.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

fn default_rows_per_buffer() -> u32 {
    1000
}

fn default_repetitions() -> u64 {
    5000
}

fn default_statement_timeout_secs() -> u64 {
    300
}

impl Default for LoadShape {
    fn default() -> Self {
        Self {
            rows_per_buffer: default_rows_per_buffer(),
            repetitions: default_repetitions(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

impl LoadShape {
    /// Rows one worker contributes to the shared table.
    pub fn rows_per_worker(&self) -> u64 {
        u64::from(self.rows_per_buffer) * self.repetitions
    }
}

/// Immutable description of one worker. One per concurrent task.
#[derive(Debug, Clone)]
pub struct WorkerDescriptor {
    pub worker_id: u32,
    pub target_table: String,
}

/// Terminal report of a successful worker.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker_id: u32,
    pub rows_written: u64,
    pub duration: Duration,
}

/// Run one bulk copy into `descriptor.target_table`.
///
/// Renders the page buffer, acquires a dedicated connection, raises the
/// statement timeout, then streams the repeated buffer through
/// `COPY ... FROM STDIN` in text tab-delimited format. No retry: any
/// failure is the worker's terminal state.
pub async fn run_worker(
    options: &ConnectOptions,
    descriptor: &WorkerDescriptor,
    shape: &LoadShape,
) -> Result<WorkerReport> {
    validate_identifier(&descriptor.target_table)?;
    let start = Instant::now();

    let buf = render_rows(descriptor.worker_id, shape.rows_per_buffer);

    tracing::debug!(worker = descriptor.worker_id, "connecting");
    let client = connect_async(options).await?;

    // The connection is already acquired at this point, so a rejected
    // session setting is a copy-phase failure, not a connection one.
    client
        .batch_execute(&format!(
            "SET statement_timeout = '{}s'",
            shape.statement_timeout_secs
        ))
        .await
        .map_err(classify_copy_error)?;

    tracing::info!(
        worker = descriptor.worker_id,
        table = descriptor.target_table,
        rows = shape.rows_per_worker(),
        "starting copy"
    );

    let sink = client
        .copy_in(&format!(
            "COPY {} FROM STDIN",
            descriptor.target_table
        ))
        .await
        .map_err(classify_copy_error)?;
    let mut sink = Box::pin(sink);

    let mut chunks = Box::pin(repeat_buffer(buf, shape.repetitions));
    while let Some(chunk) = chunks.next().await {
        sink.send(chunk).await.map_err(classify_copy_error)?;
    }

    let rows_written = sink.as_mut().finish().await.map_err(classify_copy_error)?;

    let duration = start.elapsed();
    tracing::info!(
        worker = descriptor.worker_id,
        rows = rows_written,
        elapsed_secs = duration.as_secs_f64(),
        "copy complete"
    );

    Ok(WorkerReport {
        worker_id: descriptor.worker_id,
        rows_written,
        duration,
    })
}
