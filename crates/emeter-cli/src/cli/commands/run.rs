//! `emeter run` – download archives for the whole car range.

use anyhow::Result;
use emeter_core::batch::BatchRunner;
use emeter_core::config::EmeterConfig;
use emeter_core::source::HttpArchiveSource;

use crate::cli::console::ConsoleObserver;

pub fn run_batch(cfg: &EmeterConfig, overwrite: bool) -> Result<()> {
    let source = HttpArchiveSource::new(cfg)?;
    let mut runner =
        BatchRunner::new(source, &cfg.output_dir, cfg.throttle()).with_overwrite(overwrite);
    tracing::info!(
        first = cfg.first_car,
        last = cfg.last_car,
        out_dir = %cfg.output_dir.display(),
        "starting batch"
    );

    let mut console = ConsoleObserver::new();
    let summary = runner.run(cfg.car_range(), &mut console)?;

    println!(
        "Done: {} downloaded, {} already present, {} without e-meter data, {} failed.",
        summary.downloaded,
        summary.already_present,
        summary.no_link,
        summary.failed.len()
    );
    Ok(())
}
