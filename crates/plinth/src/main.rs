//! plinth CLI - static site generator for template-driven blogs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "plinth")]
#[command(about = "Static site generator for template-driven blogs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the site config file
    #[arg(short, long, default_value = "ssg.yaml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter site in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the site
    Build {
        /// Output directory
        #[arg(short, long, default_value = "website")]
        output: PathBuf,

        /// Skip the HEAD check of referenced assets
        #[arg(long)]
        no_verify_assets: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Build {
            output,
            no_verify_assets,
        } => {
            commands::build::run(&cli.config, output, !no_verify_assets)?;
        }
    }

    Ok(())
}
