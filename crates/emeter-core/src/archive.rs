//! Archive retrieval: stub endpoint exchange, then a streamed download.

use crate::config::TimeoutConfig;
use crate::error::FetchError;
use crate::http::HttpSession;
use crate::identifier::TeamIdentifier;
use crate::progress::TransferProgress;
use crate::storage::ArchiveWriter;
use std::cell::Cell;
use std::path::Path;
use std::time::Instant;

/// Stub endpoint that answers with the archive's relative path.
pub fn stub_url(api_host: &str, id: &TeamIdentifier) -> String {
    format!(
        "{}/DownloadCompetitionTeamData/{}/{}",
        api_host.trim_end_matches('/'),
        id.competition_id,
        id.team_id
    )
}

/// Builds the archive URL from a stub body such as `"/download/abc123.zip"`.
///
/// Whitespace and surrounding quotes are stripped and JSON escapes decoded.
/// A body that is already an absolute http(s) URL is used as is.
pub fn archive_url_from_stub(api_host: &str, body: &str) -> Option<String> {
    let trimmed = body.trim();
    let path = serde_json::from_str::<String>(trimmed)
        .unwrap_or_else(|_| trimmed.trim_matches('"').to_string());
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    if path.starts_with('/') {
        Some(format!("{}{}", api_host.trim_end_matches('/'), path))
    } else {
        Some(format!("{}/{}", api_host.trim_end_matches('/'), path))
    }
}

/// Resolves the archive URL for `id` through the stub endpoint.
pub fn resolve_archive_url(
    session: &mut HttpSession,
    api_host: &str,
    id: &TeamIdentifier,
    timeouts: &TimeoutConfig,
) -> Result<String, FetchError> {
    let stub = stub_url(api_host, id);
    let body = session.get_text(&stub, &[("Accept", "*")], timeouts.stub())?;
    let url = archive_url_from_stub(api_host, &body).ok_or(FetchError::EmptyStub { url: stub })?;
    tracing::debug!(team = %id, archive = %url, "resolved archive url");
    Ok(url)
}

/// Streams `url` to `dest`, reporting progress after every chunk.
///
/// The body goes to `<dest>.part` and is renamed to `dest` only after the
/// whole stream succeeded. Returns the number of bytes written.
pub fn stream_archive(
    session: &mut HttpSession,
    url: &str,
    dest: &Path,
    timeouts: &TimeoutConfig,
    progress: &mut dyn FnMut(&TransferProgress),
) -> Result<u64, FetchError> {
    let label = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dest.display().to_string());
    let started = Instant::now();
    let total: Cell<Option<u64>> = Cell::new(None);
    let mut writer: Option<ArchiveWriter> = None;

    let snapshot = |done: u64| TransferProgress {
        label: label.clone(),
        bytes_done: done,
        total_bytes: total.get(),
        elapsed_secs: started.elapsed().as_secs_f64(),
    };

    session.download_to(
        url,
        timeouts.archive(),
        |meta| total.set(meta.content_length),
        |chunk| {
            if writer.is_none() {
                writer = Some(ArchiveWriter::create(dest)?);
            }
            if let Some(w) = writer.as_mut() {
                w.write_chunk(chunk)?;
                progress(&snapshot(w.bytes_written()));
            }
            Ok(())
        },
    )?;

    let writer = match writer {
        Some(w) => w,
        // Empty body still yields an (empty) archive file.
        None => ArchiveWriter::create(dest)?,
    };
    let written = writer.finalize(dest)?;
    progress(&snapshot(written));
    Ok(written)
}

/// Full archive fetch for one team: stub exchange, then streamed download.
pub fn fetch_archive(
    session: &mut HttpSession,
    api_host: &str,
    id: &TeamIdentifier,
    dest: &Path,
    timeouts: &TimeoutConfig,
    progress: &mut dyn FnMut(&TransferProgress),
) -> Result<u64, FetchError> {
    let url = resolve_archive_url(session, api_host, id, timeouts)?;
    stream_archive(session, &url, dest, timeouts, progress)
}
