//! Network side of the pipeline behind a trait.
//!
//! The batch runner only depends on this trait and does not know about
//! curl, the results site markup, or the API layout.

use crate::archive;
use crate::config::{EmeterConfig, TimeoutConfig};
use crate::http::HttpSession;
use crate::identifier::TeamIdentifier;
use crate::link;
use crate::progress::TransferProgress;
use anyhow::Result;
use std::path::Path;

/// Link lookup and archive fetch for one team at a time.
pub trait TeamArchiveSource {
    /// Absolute E-Meter data link for `car`, or `None` when the team published none.
    fn team_link(&mut self, car: u32) -> Result<Option<String>>;

    /// Downloads the archive for `id` to `dest`; returns bytes written.
    fn fetch_archive(
        &mut self,
        id: &TeamIdentifier,
        dest: &Path,
        progress: &mut dyn FnMut(&TransferProgress),
    ) -> Result<u64>;
}

/// Live implementation: results site + backend API over one reused HTTP session.
pub struct HttpArchiveSource {
    session: HttpSession,
    results_base: String,
    results_tab: String,
    api_host: String,
    timeouts: TimeoutConfig,
}

impl HttpArchiveSource {
    pub fn new(cfg: &EmeterConfig) -> Result<Self> {
        Ok(Self {
            session: HttpSession::new()?,
            results_base: cfg.results_base.clone(),
            results_tab: cfg.results_tab.clone(),
            api_host: cfg.api_host.clone(),
            timeouts: cfg.timeouts(),
        })
    }
}

impl TeamArchiveSource for HttpArchiveSource {
    fn team_link(&mut self, car: u32) -> Result<Option<String>> {
        let found = link::fetch_team_link(
            &mut self.session,
            &self.results_base,
            &self.results_tab,
            car,
            self.timeouts.page(),
        )?;
        Ok(found)
    }

    fn fetch_archive(
        &mut self,
        id: &TeamIdentifier,
        dest: &Path,
        progress: &mut dyn FnMut(&TransferProgress),
    ) -> Result<u64> {
        let bytes = archive::fetch_archive(
            &mut self.session,
            &self.api_host,
            id,
            dest,
            &self.timeouts,
            progress,
        )?;
        Ok(bytes)
    }
}
