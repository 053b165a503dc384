mod commands;
mod models;
mod paths;
mod report;
mod stats;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "vrecap", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a year-in-review from a built viewing history
    #[command(alias = "r")]
    Recap {
        /// Built JSON file
        input: PathBuf,

        /// Target year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Print the full statistics snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Output file ('-' for stdout)
        #[arg(short, long, default_value = "-")]
        out: PathBuf,
    },

    /// Set a config value (format, rows)
    Config { key: String, value: String },

    /// Show config location and current settings
    Info,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recap {
            input,
            year,
            json,
            out,
        } => commands::recap(&input, year, json, &out),
        Commands::Config { key, value } => commands::config(&key, &value),
        Commands::Info => commands::info(),
    }
}

/// Logs go to stderr so stdout stays clean for the report.
/// `RUST_LOG` sets the filter, `VRECAP_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let use_json =
        std::env::var("VRECAP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
