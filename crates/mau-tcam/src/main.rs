//! TCAM sweep runner entry point.
//!
//! Loads a JSON vector file, replays every key through the model, and
//! prints one line per hit so runs can be diffed against a reference.

use anyhow::Context;
use clap::Parser;
use mau_tcam::sweep;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replay a TCAM vector file through the functional model
#[derive(Parser, Debug)]
#[command(name = "tcam-sweep")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Vector file to replay
    vectors: PathBuf,

    /// Write the full JSON report to this path
    #[arg(short = 'o', long)]
    report: Option<PathBuf>,

    /// Print miss records as well (hits only by default)
    #[arg(long)]
    misses: bool,

    /// Log level if RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Loading vector file {}", args.vectors.display());
    let vectors = sweep::load_file(&args.vectors)
        .with_context(|| format!("failed to load {}", args.vectors.display()))?;

    let report = sweep::run(&vectors)?;
    for record in &report.records {
        if record.hit || args.misses {
            println!("{}", record);
        }
    }
    println!(
        "{}: {} keys swept, {} hit record(s)",
        report.generation, report.keys, report.hits
    );

    if let Some(path) = &args.report {
        sweep::write_report(&report, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
