//! SIMM CLI - Command Line Operations for Initial Margin
//!
//! This is the operational entry point for the SIMM calculator.
//!
//! # Commands
//!
//! - `simm calculate --crif <file>` - Calculate SIMM for a CRIF file
//! - `simm check` - Validate the run configuration
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate loads CRIF files and run
//! configurations and hands them to `pricer_simm`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod loader;

pub use error::{CliError, Result};

/// ISDA SIMM Initial Margin CLI
#[derive(Parser)]
#[command(name = "simm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run configuration file path
    #[arg(short, long, global = true, default_value = "simm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate SIMM for a CRIF file
    Calculate {
        /// Path to CRIF file (CSV)
        #[arg(long)]
        crif: PathBuf,

        /// Output format (table, json, csv)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Report every regulation set instead of the winning regulation only
        #[arg(short, long)]
        all: bool,
    },

    /// Check the run configuration and, optionally, a CRIF file
    Check {
        /// Path to CRIF file (CSV)
        #[arg(long)]
        crif: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialise tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut run_config = config::RunConfig::load(&cli.config)?;
    if !cli.verbose {
        run_config.calculator.quiet = true;
    }

    match cli.command {
        Commands::Calculate { crif, format, all } => {
            commands::calculate::run(&crif, &run_config, &format, all)
        }
        Commands::Check { crif } => commands::check::run(&cli.config, &run_config, crif.as_deref()),
    }
}
