//! `emeter fetch` – download the archive for one car.

use anyhow::{Context, Result};
use emeter_core::batch::{BatchObserver, BatchRunner, TeamOutcome};
use emeter_core::config::EmeterConfig;
use emeter_core::source::HttpArchiveSource;

use crate::cli::console::ConsoleObserver;

pub fn run_fetch(cfg: &EmeterConfig, car: u32, force: bool) -> Result<()> {
    std::fs::create_dir_all(&cfg.output_dir).with_context(|| {
        format!("failed to create output directory {}", cfg.output_dir.display())
    })?;
    let source = HttpArchiveSource::new(cfg)?;
    let mut runner =
        BatchRunner::new(source, &cfg.output_dir, cfg.throttle()).with_overwrite(force);

    let mut console = ConsoleObserver::new();
    let outcome = runner
        .process_team(car, &mut console)
        .with_context(|| format!("car {}", car))?;
    console.on_team_done(car, &outcome);
    match outcome {
        TeamOutcome::Downloaded { .. } => {}
        TeamOutcome::AlreadyPresent { path } => {
            println!("[{}] already present at {} (use --force to re-download)", car, path.display());
        }
        TeamOutcome::NoLink => println!("[{}] no E-Meter data published", car),
    }
    Ok(())
}
