//! Progress reporting for archive downloads (bytes done, rate, ETA).
//!
//! The total comes from `Content-Length` and may be missing; in that case
//! the snapshot is indeterminate and renders without a percentage.

/// Snapshot of one archive transfer (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Destination file name, for display.
    pub label: String,
    /// Bytes written so far.
    pub bytes_done: u64,
    /// Total size in bytes, if the server sent `Content-Length`.
    pub total_bytes: Option<u64>,
    /// Elapsed time since the archive request started (seconds).
    pub elapsed_secs: f64,
}

impl TransferProgress {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Fraction complete in [0.0, 1.0], or None when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            None => None,
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
        }
    }

    /// Estimated seconds remaining (None if the total is unknown or the rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes?.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total_bytes, Some(t) if self.bytes_done >= t)
    }

    /// One status line, e.g. `car_201.zip  1.5 / 3.0 MiB (50.0%)  0.75 MiB/s  ETA 2s`.
    pub fn render(&self) -> String {
        let done_mib = mib(self.bytes_done);
        let rate_mib = self.bytes_per_sec() / MIB;
        match (self.total_bytes, self.fraction()) {
            (Some(total), Some(fraction)) => {
                let eta = self
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                format!(
                    "{}  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}",
                    self.label,
                    done_mib,
                    mib(total),
                    fraction * 100.0,
                    rate_mib,
                    eta
                )
            }
            _ => format!("{}  {:.1} MiB  {:.2} MiB/s", self.label, done_mib, rate_mib),
        }
    }
}

const MIB: f64 = 1_048_576.0;

fn mib(bytes: u64) -> f64 {
    bytes as f64 / MIB
}
