//! Profile distiller CLI: reads an observation log, writes a Limited-Value Map.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use vase_core::DistillerParams;
use vase_distill::distill;

#[derive(Parser)]
#[command(name = "vase-distill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Distill an observation log into a Limited-Value Map", long_about = None)]
struct Cli {
    /// Path to the observation log to read
    #[arg(long)]
    log: PathBuf,

    /// Path to write the Limited-Value Map to
    #[arg(long)]
    out: PathBuf,

    /// Maximum distinct values retained per (site, variable)
    #[arg(long, default_value_t = DistillerParams::default().max_values)]
    max_values: usize,

    /// Minimum occurrence count for a value to survive
    #[arg(long, default_value_t = DistillerParams::default().min_occurrence)]
    min_occurrence: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let params = DistillerParams { min_occurrence: cli.min_occurrence, max_values: cli.max_values };

    // An unreadable log yields an empty map, not a failure (spec.md
    // §4.3 "Failure semantics").
    let log_text = fs::read_to_string(&cli.log).unwrap_or_else(|err| {
        tracing::warn!(path = %cli.log.display(), error = %err, "could not read observation log, distilling an empty map");
        String::new()
    });

    let (map, warnings) = distill(log_text.lines(), &params);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(sites = map.sites().count(), skipped = warnings.len(), "distillation complete");

    match map.save(&cli.out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(path = %cli.out.display(), error = %err, "failed to write limited-value map");
            ExitCode::FAILURE
        }
    }
}
