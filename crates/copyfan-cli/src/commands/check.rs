use std::path::Path;

use anyhow::{Context, Result};

use copyfan_core::config::parse_scenario;
use copyfan_core::connect::connect_async;

/// Execute the `check` command: validate scenario config and connectivity.
pub async fn execute(scenario_path: &Path) -> Result<()> {
    // 1. Parse scenario YAML
    let scenario = parse_scenario(scenario_path)
        .with_context(|| format!("Failed to parse scenario: {}", scenario_path.display()))?;

    // 2. Validate scenario structure
    scenario.validate()?;
    println!("Scenario structure: OK");

    // 3. Check connectivity
    let client = connect_async(&scenario.connection)
        .await
        .context("Connection check failed")?;
    client
        .query_one("SELECT 1", &[])
        .await
        .context("Connection test query failed")?;
    println!(
        "Connection:         OK ({}:{}/{})",
        scenario.connection.host, scenario.connection.port, scenario.connection.database
    );

    // 4. Check target table
    let row = client
        .query_one("SELECT to_regclass($1)::text", &[&scenario.table])
        .await
        .context("Table existence query failed")?;
    let exists: Option<String> = row.get(0);
    match exists {
        Some(name) => println!("Target table:       OK ({name})"),
        None => println!(
            "Target table:       MISSING ('{}' will need to be created before `run`)",
            scenario.table
        ),
    }

    println!("\nAll checks passed.");
    Ok(())
}
