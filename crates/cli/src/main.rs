//! ResearchFlow CLI — the main entry point.
//!
//! Commands:
//! - `research` — Interactive session, or one query with `--query` (default)
//! - `doctor`   — Diagnose configuration, credentials and connectivity
//! - `init`     — Write the default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "researchflow",
    about = "ResearchFlow — web research, reliability charts and Word reports",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging and stage progress
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.researchflow/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a question (interactive unless --query is given)
    Research {
        /// Run a single query instead of the interactive session
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Diagnose configuration, credentials and connectivity
    Doctor,

    /// Write the default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Research { query: None }) {
        Commands::Init => commands::init::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Research { query } => {
            let config = match commands::load_config(config_path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            };
            let _guard = logging::init(cli.verbose, &config.log_dir());
            commands::research::run(config, query, cli.verbose).await?;
        }
    }

    Ok(())
}
