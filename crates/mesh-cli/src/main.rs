//! handles: Command-line interface for handle editing sessions.
//!
//! Replays recorded mouse and keyboard sessions through the interaction
//! controller and inspects handle constraint files, for scripting and
//! regression checks without a viewer.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mesh_handles=info` - Region and file operations
//! - `RUST_LOG=mesh_handles=debug` - Gesture and mode changes
//! - `RUST_LOG=mesh_handles::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Replay a session and keep the resulting regions
//! RUST_LOG=mesh_handles=info handles replay session.json -o regions.txt
//!
//! # Check a constraint file against a 1024-vertex mesh
//! handles inspect regions.txt --vertices 1024 --format json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{inspect, replay};

/// handles - Replay and inspect handle editing sessions.
///
/// Select handle regions, drag them and check the resulting constraint files.
#[derive(Parser)]
#[command(name = "handles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON session script through the interaction controller
    Replay {
        /// Session script (mesh, camera and events)
        script: PathBuf,

        /// Write the resulting constraint file here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load this constraint file before replaying the events
        #[arg(long)]
        constraints: Option<PathBuf>,

        /// Interaction settings (TOML), overriding the script's settings
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Report the regions stored in a constraint file
    Inspect {
        /// Constraint file, one region id per vertex
        input: PathBuf,

        /// Expected vertex count of the mesh
        #[arg(long)]
        vertices: Option<usize>,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_handles=info",
            2 => "mesh_handles=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Replay {
            script,
            output,
            constraints,
            config,
        } => replay::run(
            script,
            output.as_deref(),
            constraints.as_deref(),
            config.as_deref(),
            &cli,
        ),
        Commands::Inspect { input, vertices } => inspect::run(input, *vertices, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(handle_err) = e.downcast_ref::<mesh_handles::HandleError>() {
                eprintln!("{}: {}", "Error".red().bold(), handle_err);
                eprintln!("  {}: {}", "Code".cyan(), handle_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    handle_err.recovery_suggestion()
                );
                if let Some(location) = handle_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
