//! Hybrid L1-I prefetcher trace replay CLI.
//!
//! This binary provides a single entry point for replay runs. It performs:
//! 1. **Trace run:** Replay a trace file (or a built-in synthetic loop) with the
//!    default or a JSON configuration and print the statistics and the
//!    prefetcher's end of run report.
//! 2. **Config dump:** Print the default configuration as JSON, as a starting
//!    point for custom configurations.
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use hybridpf_core::config::Config;
use hybridpf_core::sim::{self, Replay, TraceEvent};

#[derive(Parser, Debug)]
#[command(
    name = "hybridpf",
    author,
    version,
    about = "Learned-filter hybrid L1-I prefetcher replay",
    long_about = "Replay an instruction fetch trace through the hybrid prefetcher.\n\nTrace lines are `B <ip> <kind> <target>` for resolved branches and `F <address>` for fetches.\n\nExamples:\n  hybridpf run traces/loop.trace\n  hybridpf run traces/loop.trace --config tuned.json\n  hybridpf run --synthetic 1000\n  hybridpf config > default.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print the report.
    Run {
        /// Trace file to replay.
        trace: Option<PathBuf>,

        /// JSON configuration (defaults are used for missing fields).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replay a synthetic loop of this many iterations instead of a file.
        #[arg(long, conflicts_with = "trace")]
        synthetic: Option<usize>,

        /// Blocks in the synthetic loop body.
        #[arg(long, default_value_t = 48)]
        body: u64,
    },

    /// Print the default configuration as JSON.
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            trace,
            config,
            synthetic,
            body,
        } => cmd_run(trace, config, synthetic, body),
        Commands::Config => cmd_config(),
    };

    if let Err(message) = result {
        error!("{message}");
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

/// Loads the configuration and events, replays them and prints the report.
fn cmd_run(
    trace: Option<PathBuf>,
    config: Option<PathBuf>,
    synthetic: Option<usize>,
    body: u64,
) -> Result<(), String> {
    let config = match config {
        Some(path) => Config::from_path(&path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => Config::default(),
    };

    let events: Vec<TraceEvent> = match (trace, synthetic) {
        (Some(path), _) => {
            sim::read_trace(&path).map_err(|e| format!("{}: {e}", path.display()))?
        }
        (None, Some(iterations)) => sim::synthetic_loop(0x40_0000, body, iterations),
        (None, None) => return Err("specify a trace file or --synthetic <iterations>".into()),
    };

    let mut replay = Replay::new(&config).map_err(|e| e.to_string())?;
    let _ = replay.run(&events);
    println!("{}", replay.report());
    Ok(())
}

/// Prints `Config::default()` as pretty JSON.
fn cmd_config() -> Result<(), String> {
    let json = serde_json::to_string_pretty(&Config::default()).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
