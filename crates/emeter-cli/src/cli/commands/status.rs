//! `emeter status` – show which archives in the range are on disk.

use anyhow::Result;
use emeter_core::batch::archive_path;
use emeter_core::config::EmeterConfig;
use emeter_core::storage::temp_path;
use std::path::Path;

/// On-disk state of one car's archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArchiveState {
    Present(u64),
    /// Only `<name>.part` exists: an interrupted download.
    Partial(u64),
    Missing,
}

pub(crate) fn archive_state(out_dir: &Path, car: u32) -> ArchiveState {
    let path = archive_path(out_dir, car);
    if let Ok(meta) = std::fs::metadata(&path) {
        return ArchiveState::Present(meta.len());
    }
    match std::fs::metadata(temp_path(&path)) {
        Ok(meta) => ArchiveState::Partial(meta.len()),
        Err(_) => ArchiveState::Missing,
    }
}

pub fn run_status(cfg: &EmeterConfig) -> Result<()> {
    let mut present = 0u32;
    let mut total = 0u32;
    println!("{:<6} {:<10} {:<12} {}", "CAR", "STATE", "SIZE", "FILE");
    for car in cfg.car_range() {
        total += 1;
        let path = archive_path(&cfg.output_dir, car);
        let (state, size) = match archive_state(&cfg.output_dir, car) {
            ArchiveState::Present(n) => {
                present += 1;
                ("present", n.to_string())
            }
            ArchiveState::Partial(n) => ("partial", n.to_string()),
            ArchiveState::Missing => continue,
        };
        println!("{:<6} {:<10} {:<12} {}", car, state, size, path.display());
    }
    println!("{} of {} archives present in {}", present, total, cfg.output_dir.display());
    Ok(())
}
