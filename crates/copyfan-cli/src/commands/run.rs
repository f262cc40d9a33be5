use std::path::Path;

use anyhow::{Context, Result};

use copyfan_core::config::parse_scenario;
use copyfan_core::env::create_table;
use copyfan_core::orchestrator::run_load;

/// Execute the `run` command: parse, validate, and run a load scenario.
pub async fn execute(scenario_path: &Path, create_target_table: bool) -> Result<()> {
    // 1. Parse scenario YAML
    let scenario = parse_scenario(scenario_path)
        .with_context(|| format!("Failed to parse scenario: {}", scenario_path.display()))?;

    // 2. Validate
    scenario.validate()?;

    tracing::info!(
        scenario = scenario.scenario,
        table = scenario.table,
        workers = scenario.workers,
        expected_rows = scenario.expected_rows(),
        "Scenario validated"
    );

    if create_target_table {
        let instance = copyfan_core::InstanceHandle::new(scenario.connection.clone());
        let table = scenario.table.clone();
        tokio::task::spawn_blocking(move || create_table(&instance, &table, "i int, t text"))
            .await
            .context("table creation task panicked")??;
    }

    // 3. Run
    let summary = run_load(
        &scenario.connection,
        &scenario.table,
        scenario.workers,
        &scenario.shape,
    )
    .await?;

    println!("Scenario '{}' completed successfully.", scenario.scenario);
    println!("  Workers:      {}", summary.reports.len());
    println!("  Rows written: {}", summary.total_rows());
    println!("  Duration:     {:.2}s", summary.duration.as_secs_f64());
    println!(
        "  Throughput:   {:.0} rows/sec",
        summary.total_rows() as f64 / summary.duration.as_secs_f64().max(f64::EPSILON)
    );
    for report in &summary.reports {
        println!(
            "  worker {:>3}: {} rows in {:.2}s",
            report.worker_id,
            report.rows_written,
            report.duration.as_secs_f64()
        );
    }

    Ok(())
}
