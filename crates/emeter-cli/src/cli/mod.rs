//! CLI for the emeter archive retriever.

mod commands;
mod console;

use anyhow::Result;
use clap::{Parser, Subcommand};
use emeter_core::config::{self, EmeterConfig};
use std::path::PathBuf;

use commands::{run_batch, run_fetch, run_link, run_status};

/// Top-level CLI for the emeter archive retriever.
#[derive(Debug, Parser)]
#[command(name = "emeter")]
#[command(about = "emeter: download per-team energy meter archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download archives for every car in the range, skipping ones already on disk.
    Run {
        /// First car number (inclusive); defaults to the configured range.
        #[arg(long, value_name = "N")]
        from: Option<u32>,
        /// Last car number (inclusive).
        #[arg(long, value_name = "N")]
        to: Option<u32>,
        /// Directory for car_NNN.zip files.
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
        /// Pause between teams in milliseconds.
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
        /// Re-download archives that already exist.
        #[arg(long)]
        overwrite: bool,
    },

    /// Download the archive for a single car.
    Fetch {
        /// Car number.
        car: u32,
        /// Directory for car_NNN.zip files.
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
        /// Re-download even if the archive exists.
        #[arg(long)]
        force: bool,
    },

    /// Show the E-Meter link and team identifiers for a car without downloading.
    Link {
        /// Car number.
        car: u32,
    },

    /// List which archives in the range are already on disk.
    Status {
        #[arg(long, value_name = "N")]
        from: Option<u32>,
        #[arg(long, value_name = "N")]
        to: Option<u32>,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}

/// Applies per-run flags on top of the loaded config.
pub(crate) fn apply_overrides(
    cfg: &mut EmeterConfig,
    from: Option<u32>,
    to: Option<u32>,
    out_dir: Option<PathBuf>,
    delay_ms: Option<u64>,
) -> Result<()> {
    if let Some(from) = from {
        cfg.first_car = from;
    }
    if let Some(to) = to {
        cfg.last_car = to;
    }
    if let Some(dir) = out_dir {
        cfg.output_dir = dir;
    }
    if let Some(ms) = delay_ms {
        cfg.throttle_ms = ms;
    }
    if cfg.first_car > cfg.last_car {
        anyhow::bail!(
            "empty car range: {} > {}",
            cfg.first_car,
            cfg.last_car
        );
    }
    Ok(())
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                from,
                to,
                out_dir,
                delay_ms,
                overwrite,
            } => {
                apply_overrides(&mut cfg, from, to, out_dir, delay_ms)?;
                run_batch(&cfg, overwrite)?;
            }
            CliCommand::Fetch {
                car,
                out_dir,
                force,
            } => {
                if let Some(dir) = out_dir {
                    cfg.output_dir = dir;
                }
                run_fetch(&cfg, car, force)?;
            }
            CliCommand::Link { car } => run_link(&cfg, car)?,
            CliCommand::Status { from, to, out_dir } => {
                apply_overrides(&mut cfg, from, to, out_dir, None)?;
                run_status(&cfg)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
