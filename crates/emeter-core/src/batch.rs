//! Batch loop over a car-number range.
//!
//! Each team runs inside its own failure boundary: errors are logged with the
//! car number, recorded in the summary, and the loop moves on. The archive
//! file on disk is the only idempotence marker.

use crate::identifier::TeamIdentifier;
use crate::progress::TransferProgress;
use crate::source::TeamArchiveSource;
use anyhow::{Context, Result};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `car_201.zip`; numbers below 100 are zero-padded to three digits.
pub fn archive_file_name(car: u32) -> String {
    format!("car_{:03}.zip", car)
}

pub fn archive_path(out_dir: &Path, car: u32) -> PathBuf {
    out_dir.join(archive_file_name(car))
}

/// What happened to one team that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    /// Results page has no E-Meter link.
    NoLink,
    /// Archive already on disk; nothing fetched.
    AlreadyPresent { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamFailure {
    pub car: u32,
    pub message: String,
}

/// Totals for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub downloaded: u32,
    pub bytes: u64,
    pub no_link: u32,
    pub already_present: u32,
    pub failed: Vec<TeamFailure>,
}

impl BatchSummary {
    fn record(&mut self, outcome: &TeamOutcome) {
        match outcome {
            TeamOutcome::Downloaded { bytes, .. } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            TeamOutcome::NoLink => self.no_link += 1,
            TeamOutcome::AlreadyPresent { .. } => self.already_present += 1,
        }
    }

    pub fn processed(&self) -> u32 {
        self.downloaded + self.no_link + self.already_present + self.failed.len() as u32
    }
}

/// Hooks for user-facing output. All methods default to no-ops.
pub trait BatchObserver {
    fn on_progress(&mut self, _car: u32, _progress: &TransferProgress) {}
    fn on_team_done(&mut self, _car: u32, _outcome: &TeamOutcome) {}
    fn on_team_failed(&mut self, _car: u32, _error: &anyhow::Error) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

pub struct BatchRunner<S> {
    source: S,
    out_dir: PathBuf,
    throttle: Duration,
    overwrite: bool,
}

impl<S: TeamArchiveSource> BatchRunner<S> {
    pub fn new(source: S, out_dir: impl Into<PathBuf>, throttle: Duration) -> Self {
        Self {
            source,
            out_dir: out_dir.into(),
            throttle,
            overwrite: false,
        }
    }

    /// Re-download even when the archive already exists.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Link → identifiers → destination check → fetch, for one car.
    pub fn process_team(
        &mut self,
        car: u32,
        observer: &mut dyn BatchObserver,
    ) -> Result<TeamOutcome> {
        let link = self
            .source
            .team_link(car)
            .context("results page lookup failed")?;
        let Some(link) = link else {
            return Ok(TeamOutcome::NoLink);
        };
        let id = TeamIdentifier::from_team_data_url(&link)?;

        let dest = archive_path(&self.out_dir, car);
        if dest.exists() && !self.overwrite {
            tracing::debug!(car, path = %dest.display(), "archive already present");
            return Ok(TeamOutcome::AlreadyPresent { path: dest });
        }

        tracing::info!(car, team = %id, "fetching archive");
        let bytes = self
            .source
            .fetch_archive(&id, &dest, &mut |p| observer.on_progress(car, p))
            .with_context(|| format!("archive download for team {}", id))?;
        Ok(TeamOutcome::Downloaded { path: dest, bytes })
    }

    /// Runs every car in `cars` sequentially, sleeping the throttle interval between teams.
    ///
    /// Only a failure to create the output directory aborts the batch.
    pub fn run(
        &mut self,
        cars: RangeInclusive<u32>,
        observer: &mut dyn BatchObserver,
    ) -> Result<BatchSummary> {
        fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("failed to create output directory {}", self.out_dir.display())
        })?;

        let mut summary = BatchSummary::default();
        let last = *cars.end();
        for car in cars {
            match self.process_team(car, observer) {
                Ok(outcome) => {
                    summary.record(&outcome);
                    observer.on_team_done(car, &outcome);
                }
                Err(e) => {
                    tracing::warn!(car, error = %format!("{:#}", e), "team failed");
                    observer.on_team_failed(car, &e);
                    summary.failed.push(TeamFailure {
                        car,
                        message: format!("{:#}", e),
                    });
                }
            }
            if car != last && !self.throttle.is_zero() {
                std::thread::sleep(self.throttle);
            }
        }

        tracing::info!(
            downloaded = summary.downloaded,
            no_link = summary.no_link,
            already_present = summary.already_present,
            failed = summary.failed.len(),
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory source: links per car, archive bodies per team id, call log.
    #[derive(Default)]
    struct FakeSource {
        links: HashMap<u32, String>,
        bodies: HashMap<String, Vec<u8>>,
        link_errors: Vec<u32>,
        fetches: Vec<TeamIdentifier>,
    }

    impl FakeSource {
        fn with_team(mut self, car: u32, comp: &str, team: &str, body: &[u8]) -> Self {
            self.links.insert(
                car,
                format!("https://emeter.example/TeamData.aspx?CompetitionID={comp}&TeamID={team}"),
            );
            self.bodies.insert(team.to_string(), body.to_vec());
            self
        }
    }

    impl TeamArchiveSource for FakeSource {
        fn team_link(&mut self, car: u32) -> Result<Option<String>> {
            if self.link_errors.contains(&car) {
                anyhow::bail!("GET results page returned HTTP 503");
            }
            Ok(self.links.get(&car).cloned())
        }

        fn fetch_archive(
            &mut self,
            id: &TeamIdentifier,
            dest: &Path,
            progress: &mut dyn FnMut(&TransferProgress),
        ) -> Result<u64> {
            self.fetches.push(id.clone());
            let body = self
                .bodies
                .get(&id.team_id)
                .ok_or_else(|| anyhow::anyhow!("stub returned HTTP 404"))?;
            fs::write(dest, body)?;
            progress(&TransferProgress {
                label: archive_file_name(0),
                bytes_done: body.len() as u64,
                total_bytes: Some(body.len() as u64),
                elapsed_secs: 0.0,
            });
            Ok(body.len() as u64)
        }
    }

    #[derive(Default)]
    struct Recorder {
        done: Vec<(u32, TeamOutcome)>,
        failed: Vec<u32>,
        progress_calls: u32,
    }

    impl BatchObserver for Recorder {
        fn on_progress(&mut self, _car: u32, _progress: &TransferProgress) {
            self.progress_calls += 1;
        }
        fn on_team_done(&mut self, car: u32, outcome: &TeamOutcome) {
            self.done.push((car, outcome.clone()));
        }
        fn on_team_failed(&mut self, car: u32, _error: &anyhow::Error) {
            self.failed.push(car);
        }
    }

    #[test]
    fn archive_names_are_zero_padded() {
        assert_eq!(archive_file_name(201), "car_201.zip");
        assert_eq!(archive_file_name(7), "car_007.zip");
        assert_eq!(archive_file_name(1234), "car_1234.zip");
        assert_eq!(
            archive_path(Path::new("/data"), 42),
            PathBuf::from("/data/car_042.zip")
        );
    }

    #[test]
    fn missing_link_is_a_skip_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = BatchRunner::new(FakeSource::default(), dir.path(), Duration::ZERO);
        let mut rec = Recorder::default();
        let summary = runner.run(201..=203, &mut rec).unwrap();
        assert_eq!(summary.no_link, 3);
        assert!(summary.failed.is_empty());
        assert!(rec.failed.is_empty());
        assert!(runner.source().fetches.is_empty());
    }

    #[test]
    fn downloads_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default()
            .with_team(201, "C", "T201", b"zip-201")
            .with_team(203, "C", "T203", b"zip-203!");
        let mut runner = BatchRunner::new(source, dir.path(), Duration::ZERO);
        let mut rec = Recorder::default();
        let summary = runner.run(201..=203, &mut rec).unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.bytes, 15);
        assert_eq!(summary.no_link, 1);
        assert_eq!(summary.processed(), 3);
        assert_eq!(rec.progress_calls, 2);
        assert_eq!(std::fs::read(dir.path().join("car_201.zip")).unwrap(), b"zip-201");
        assert_eq!(std::fs::read(dir.path().join("car_203.zip")).unwrap(), b"zip-203!");
        assert_eq!(
            runner.source().fetches,
            vec![TeamIdentifier::new("C", "T201"), TeamIdentifier::new("C", "T203")]
        );
    }

    #[test]
    fn existing_archive_is_never_fetched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("car_201.zip"), b"old").unwrap();
        let source = FakeSource::default().with_team(201, "C", "T201", b"new");
        let mut runner = BatchRunner::new(source, dir.path(), Duration::ZERO);
        let mut rec = Recorder::default();
        let summary = runner.run(201..=201, &mut rec).unwrap();

        assert_eq!(summary.already_present, 1);
        assert!(runner.source().fetches.is_empty());
        assert_eq!(std::fs::read(dir.path().join("car_201.zip")).unwrap(), b"old");
    }

    #[test]
    fn second_run_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default()
            .with_team(201, "C", "A", b"a")
            .with_team(202, "C", "B", b"b");
        let mut runner = BatchRunner::new(source, dir.path(), Duration::ZERO);
        runner.run(201..=202, &mut NoopObserver).unwrap();
        assert_eq!(runner.source().fetches.len(), 2);

        let summary = runner.run(201..=202, &mut NoopObserver).unwrap();
        assert_eq!(summary.already_present, 2);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(runner.source().fetches.len(), 2, "no new fetches on re-run");
    }

    #[test]
    fn overwrite_refetches_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("car_201.zip"), b"old").unwrap();
        let source = FakeSource::default().with_team(201, "C", "T201", b"new");
        let mut runner =
            BatchRunner::new(source, dir.path(), Duration::ZERO).with_overwrite(true);
        let outcome = runner.process_team(201, &mut NoopObserver).unwrap();
        assert!(matches!(outcome, TeamOutcome::Downloaded { bytes: 3, .. }));
        assert_eq!(std::fs::read(dir.path().join("car_201.zip")).unwrap(), b"new");
    }

    #[test]
    fn failures_are_isolated_per_team() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::default()
            .with_team(202, "C", "T202", b"ok")
            .with_team(204, "C", "T204", b"ok too");
        // Link without TeamID.
        source
            .links
            .insert(201, "https://emeter.example/TeamData.aspx?CompetitionID=C".to_string());
        // Link lookup error.
        source.link_errors.push(203);
        // Stub failure: no body registered for this team.
        source.bodies.remove("T204");

        let mut runner = BatchRunner::new(source, dir.path(), Duration::ZERO);
        let mut rec = Recorder::default();
        let summary = runner.run(201..=204, &mut rec).unwrap();

        assert_eq!(summary.downloaded, 1);
        let failed_cars: Vec<u32> = summary.failed.iter().map(|f| f.car).collect();
        assert_eq!(failed_cars, vec![201, 203, 204]);
        assert_eq!(rec.failed, vec![201, 203, 204]);
        assert!(summary.failed[0].message.contains("TeamID"));
        assert!(summary.failed[1].message.contains("503"));
        assert!(summary.failed[2].message.contains("404"));
        assert!(!dir.path().join("car_204.zip").exists());
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data").join("raw");
        let mut runner = BatchRunner::new(FakeSource::default(), &out, Duration::ZERO);
        runner.run(1..=1, &mut NoopObserver).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn throttle_sleeps_between_teams_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner =
            BatchRunner::new(FakeSource::default(), dir.path(), Duration::from_millis(30));
        let started = std::time::Instant::now();
        runner.run(1..=3, &mut NoopObserver).unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(60), "{elapsed:?}");
    }
}
