mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "copyfan",
    version,
    about = "Concurrent COPY bulk-load harness for PostgreSQL"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load scenario
    Run {
        /// Path to scenario YAML file
        scenario: PathBuf,
        /// Create the target table before loading
        #[arg(long)]
        create_table: bool,
    },
    /// Validate scenario configuration and connectivity
    Check {
        /// Path to scenario YAML file
        scenario: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run {
            scenario,
            create_table,
        } => commands::run::execute(&scenario, create_table).await,
        Commands::Check { scenario } => commands::check::execute(&scenario).await,
    }
}
