use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod commands;
mod utils;

use commands::{BundleCommand, BundleSettings};
use utils::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle the OpenAPI specification into its normalized location
    Bundle {
        /// Project root that every path is resolved against [default: current directory]
        #[arg(long)]
        root: Option<PathBuf>,
        /// Settings file, relative to the project root
        #[arg(long, default_value = ".specbundle")]
        config: PathBuf,
        /// Log each step to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Bundle { root, config, verbose } => {
            utils::set_up_logging(verbose)?;

            let root = match root {
                Some(root) => std::path::absolute(&root)
                    .with_context(|| format!("Failed to resolve project root {}", root.display()))?,
                None => std::env::current_dir().context("Failed to resolve the current directory")?,
            };
            let config = Config::new(&root.join(config))?;

            BundleCommand::new(root, BundleSettings::from_config(&config))
                .execute()
                .await?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
