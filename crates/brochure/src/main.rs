//! Brochure CLI - partial registry tooling for marketing sites.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "brochure")]
#[command(about = "Manage the partials a brochure site is built from")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to brochure.toml config file
    #[arg(short, long, default_value = "brochure.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a config file and example partials
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Load every partial and verify its dependencies
    Check,

    /// List discovered partials
    List,

    /// Render a partial with its dependency styles
    Render {
        /// Partial name
        name: String,

        /// Props as a JSON object
        #[arg(short, long)]
        props: Option<String>,
    },

    /// Reload partials as their files change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Check => {
            commands::check::run(&cli.config).await?;
        }
        Commands::List => {
            commands::list::run(&cli.config).await?;
        }
        Commands::Render { name, props } => {
            commands::render::run(&cli.config, &name, props.as_deref()).await?;
        }
        Commands::Watch => {
            commands::watch::run(&cli.config).await?;
        }
    }

    Ok(())
}
