//! Blocking HTTP session over libcurl.
//!
//! One `Easy` handle is kept for the whole run so libcurl can reuse
//! connections and keep session cookies between the results site and the API.

use crate::error::FetchError;
use std::cell::RefCell;
use std::str;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: u32 = 10;
/// Transfers slower than this many bytes/sec for the low-speed window are aborted.
const LOW_SPEED_LIMIT: u32 = 1;

/// Bytes per chunk requested from libcurl while streaming.
pub const CHUNK_SIZE: usize = 1 << 15;

/// Response metadata collected from header lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status of the final response (after redirects).
    pub code: u32,
    /// `Content-Length` of the final response, if sent.
    pub content_length: Option<u64>,
}

/// Reusable HTTP session. Not `Sync`; the pipeline is single-threaded.
pub struct HttpSession {
    easy: curl::easy::Easy,
    user_agent: String,
}

impl HttpSession {
    pub fn new() -> Result<Self, FetchError> {
        let user_agent = format!("emeter/{}", env!("CARGO_PKG_VERSION"));
        let mut session = Self {
            easy: curl::easy::Easy::new(),
            user_agent,
        };
        session.prepare("session init")?;
        Ok(session)
    }

    /// Reset per-request options; keeps live connections and the cookie store.
    fn prepare(&mut self, url: &str) -> Result<(), FetchError> {
        let err = |e| FetchError::transport(url, e);
        self.easy.reset();
        self.easy.useragent(&self.user_agent).map_err(err)?;
        self.easy.follow_location(true).map_err(err)?;
        self.easy.max_redirections(MAX_REDIRECTS).map_err(err)?;
        self.easy.connect_timeout(CONNECT_TIMEOUT).map_err(err)?;
        // Empty path enables the in-memory cookie engine.
        self.easy.cookie_file("").map_err(err)?;
        Ok(())
    }

    fn set_headers(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<(), FetchError> {
        if headers.is_empty() {
            return Ok(());
        }
        let err = |e| FetchError::transport(url, e);
        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim())).map_err(err)?;
        }
        self.easy.http_headers(list).map_err(err)
    }

    /// GET `url` and return the body as text. Fails on transport errors and non-2xx.
    pub fn get_text(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, FetchError> {
        self.prepare(url)?;
        let err = |e| FetchError::transport(url, e);
        self.easy.url(url).map_err(err)?;
        self.easy.timeout(timeout).map_err(err)?;
        self.set_headers(url, headers)?;

        let mut body = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(err)?;
            transfer.perform().map_err(err)?;
        }

        let code = self.easy.response_code().map_err(err)?;
        tracing::debug!(url, code, bytes = body.len(), "GET text");
        check_status(url, code)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// GET `url` and stream the body into `sink` chunk by chunk.
    ///
    /// `on_start` receives the response metadata once headers are complete and
    /// before the first body byte. The transfer is aborted if it stalls for
    /// `stall_timeout`. Returns the number of body bytes handed to `sink`.
    pub fn download_to<S, F>(
        &mut self,
        url: &str,
        stall_timeout: Duration,
        mut on_start: F,
        mut sink: S,
    ) -> Result<u64, FetchError>
    where
        S: FnMut(&[u8]) -> std::io::Result<()>,
        F: FnMut(&ResponseMeta),
    {
        self.prepare(url)?;
        let err = |e| FetchError::transport(url, e);
        self.easy.url(url).map_err(err)?;
        self.easy.buffer_size(CHUNK_SIZE).map_err(err)?;
        self.easy.low_speed_limit(LOW_SPEED_LIMIT).map_err(err)?;
        self.easy.low_speed_time(stall_timeout).map_err(err)?;

        let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut written = 0u64;
        let mut started = false;
        let mut bad_status: Option<u32> = None;
        let mut storage_err: Option<std::io::Error> = None;
        let perform = {
            let mut transfer = self.easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        let mut headers = headers.borrow_mut();
                        // A status line starts a new header block (redirects, 100-continue).
                        if line.starts_with("HTTP/") {
                            headers.clear();
                        }
                        headers.push(line.to_string());
                    }
                    true
                })
                .map_err(err)?;
            transfer
                .write_function(|data| {
                    if !started {
                        started = true;
                        let meta = parse_meta(&headers.borrow());
                        if !(200..300).contains(&meta.code) {
                            bad_status = Some(meta.code);
                            return Ok(0);
                        }
                        on_start(&meta);
                    }
                    match sink(data) {
                        Ok(()) => {
                            written += data.len() as u64;
                            Ok(data.len())
                        }
                        Err(e) => {
                            tracing::warn!("archive write failed: {}", e);
                            storage_err = Some(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(err)?;
            transfer.perform()
        };

        if let Some(e) = storage_err {
            return Err(FetchError::Storage(e));
        }
        if let Some(code) = bad_status {
            return Err(FetchError::Status {
                url: url.to_string(),
                code,
            });
        }
        perform.map_err(err)?;

        let code = self.easy.response_code().map_err(err)?;
        check_status(url, code)?;
        if !started {
            // Empty body: headers were never reported through the write callback.
            on_start(&parse_meta(&headers.borrow()));
        }
        tracing::debug!(url, code, bytes = written, "GET stream");
        Ok(written)
    }
}

fn check_status(url: &str, code: u32) -> Result<(), FetchError> {
    if !(200..300).contains(&code) {
        return Err(FetchError::Status {
            url: url.to_string(),
            code,
        });
    }
    Ok(())
}

/// Parse the header block of the final response into `ResponseMeta`.
fn parse_meta(lines: &[String]) -> ResponseMeta {
    let mut meta = ResponseMeta::default();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            meta.code = line
                .split_whitespace()
                .nth(1)
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                meta.content_length = value.trim().parse().ok();
            }
        }
    }
    meta
}
