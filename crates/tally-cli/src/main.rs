use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally: resource reservation and launch message compiler",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile launch messages for one offer batch.
    ///
    /// Reads offers and task assignments (job spec + solver output) as JSON
    /// and prints the launch messages, per-task failures, and the capacity
    /// left over.
    Compile {
        /// JSON file with the offer batch
        #[arg(long)]
        offers: PathBuf,
        /// JSON file with the task assignments, in submission order
        #[arg(long)]
        tasks: PathBuf,
        /// tally.toml (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override [framework].id from the config
        #[arg(long)]
        framework_id: Option<String>,
    },
    /// Print the per-role resource pool built from an offer batch
    Pool {
        #[arg(long)]
        offers: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tally=debug"));
    // Logs go to stderr; stdout carries the JSON output.
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Compile {
            offers,
            tasks,
            config,
            framework_id,
        } => commands::compile::run(&offers, &tasks, config.as_deref(), framework_id.as_deref()),
        Commands::Pool { offers } => commands::pool::run(&offers),
        Commands::Config { config } => commands::load_config(config.as_deref())
            .and_then(|c| c.to_toml_string())
            .map(|toml| print!("{toml}")),
    }
}
