//! Terminal output for batch runs: per-team result lines on stdout, progress on stderr.

use emeter_core::batch::{BatchObserver, TeamOutcome};
use emeter_core::progress::TransferProgress;
use std::io::Write;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub struct ConsoleObserver {
    last_print: Option<Instant>,
    progress_shown: bool,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            last_print: None,
            progress_shown: false,
        }
    }

    /// Ends an in-place progress line before printing anything else.
    fn end_progress_line(&mut self) {
        if self.progress_shown {
            eprintln!();
            self.progress_shown = false;
        }
        self.last_print = None;
    }
}

impl BatchObserver for ConsoleObserver {
    fn on_progress(&mut self, _car: u32, progress: &TransferProgress) {
        let now = Instant::now();
        let due = self
            .last_print
            .map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
        if due || progress.is_complete() {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r  {}  ", progress.render());
            let _ = err.flush();
            self.last_print = Some(now);
            self.progress_shown = true;
        }
    }

    fn on_team_done(&mut self, car: u32, outcome: &TeamOutcome) {
        self.end_progress_line();
        match outcome {
            TeamOutcome::Downloaded { path, .. } => {
                println!("[{}] downloaded to {}", car, path.display());
            }
            TeamOutcome::AlreadyPresent { path } => {
                tracing::debug!(car, "skipped, {} exists", path.display());
            }
            TeamOutcome::NoLink => tracing::debug!(car, "skipped, no e-meter data"),
        }
    }

    fn on_team_failed(&mut self, car: u32, error: &anyhow::Error) {
        self.end_progress_line();
        println!("[{}] failed: {:#}", car, error);
    }
}
