//! Load orchestrator: launches workers concurrently and waits for all.

use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::connect::ConnectOptions;
use crate::error::{LoadError, Result};
use crate::worker::{run_worker, LoadShape, WorkerDescriptor, WorkerReport};

/// Aggregate outcome of a load run in which every worker succeeded.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub reports: Vec<WorkerReport>,
    pub duration: Duration,
}

impl LoadSummary {
    /// Total rows committed across all workers.
    pub fn total_rows(&self) -> u64 {
        self.reports.iter().map(|r| r.rows_written).sum()
    }
}

/// Run `workers` concurrent bulk copies into the shared `table`.
///
/// All workers are launched up front with distinct worker ids in
/// `[0, workers)`; each owns its connection, and the target table is the
/// only shared resource. The orchestrator waits for every worker to reach
/// a terminal state and then fails with the first observed error, if any.
/// Siblings are never cancelled on failure; the per-connection statement
/// timeout is the only timeout protection.
pub async fn run_load(
    options: &ConnectOptions,
    table: &str,
    workers: u32,
    shape: &LoadShape,
) -> Result<LoadSummary> {
    let start = Instant::now();
    tracing::info!(table, workers, "launching load workers");

    let mut join_set: JoinSet<Result<WorkerReport>> = JoinSet::new();
    for worker_id in 0..workers {
        let options = options.clone();
        let shape = shape.clone();
        let descriptor = WorkerDescriptor {
            worker_id,
            target_table: table.to_string(),
        };
        join_set.spawn(async move { run_worker(&options, &descriptor, &shape).await });
    }

    let reports = collect_worker_results(join_set).await?;
    let duration = start.elapsed();

    let summary = LoadSummary { reports, duration };
    tracing::info!(
        table,
        workers,
        total_rows = summary.total_rows(),
        elapsed_secs = duration.as_secs_f64(),
        "load complete"
    );
    Ok(summary)
}

/// Drain the join set, keeping every worker's report and the first error.
///
/// A failed worker does not abort its siblings; the set is always drained
/// to the last task so each worker reaches its own terminal state before
/// the overall result is decided. Task panics surface as setup failures.
pub(crate) async fn collect_worker_results(
    mut join_set: JoinSet<Result<WorkerReport>>,
) -> Result<Vec<WorkerReport>> {
    let mut reports = Vec::new();
    let mut first_error: Option<LoadError> = None;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(error)) => {
                tracing::error!("worker failed: {error}");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            Err(join_err) => {
                tracing::error!("worker task panicked: {join_err}");
                if first_error.is_none() {
                    first_error =
                        Some(LoadError::Setup(anyhow::anyhow!(
                            "worker task panicked: {join_err}"
                        )));
                }
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(reports),
    }
}
