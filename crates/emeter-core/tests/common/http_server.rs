//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves canned replies keyed by request target (path + query). Unknown
//! targets get 404. Every request target is recorded so tests can assert
//! which endpoints were hit.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    /// If false, omit `Content-Length` and delimit the body by closing the connection.
    pub send_length: bool,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            send_length: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            send_length: true,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.send_length = false;
        self
    }
}

pub struct MockSite {
    base: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MockSite {
    /// Base URL without trailing slash, e.g. `http://127.0.0.1:12345`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Number of requests whose target starts with `prefix`.
    pub fn hits(&self, prefix: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.starts_with(prefix))
            .count()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(routes: Vec<(&str, Reply)>) -> MockSite {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Reply>> = Arc::new(
        routes
            .into_iter()
            .map(|(target, reply)| (target.to_string(), reply))
            .collect(),
    );
    let hits = Arc::new(Mutex::new(Vec::new()));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    MockSite {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Reply>, hits: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(target) = read_request_target(&mut stream) else {
        return;
    };
    hits.lock().unwrap().push(target.clone());

    let reply = routes.get(&target).cloned().unwrap_or_else(|| Reply::status(404));
    let length = if reply.send_length {
        format!("Content-Length: {}\r\n", reply.body.len())
    } else {
        String::new()
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\n{}Connection: close\r\n\r\n",
        reply.status,
        reason(reply.status),
        length
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
    let _ = stream.flush();
}

/// Reads up to the end of the request head and returns the request target.
fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    parts.next().map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
