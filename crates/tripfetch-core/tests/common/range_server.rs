//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Serves a fixed set of paths. HEAD answers with Content-Length (and
//! Accept-Ranges when enabled); GET honours `Range: bytes=N-` with 206, or
//! 416 when N is at or past the end. Unknown paths get 404. Counts GETs and
//! body bytes sent so tests can assert nothing was re-transferred.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ServerStats {
    pub gets: AtomicUsize,
    pub body_bytes: AtomicU64,
}

impl ServerStats {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn body_bytes(&self) -> u64 {
        self.body_bytes.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    /// Base URL with a trailing slash, e.g. "http://127.0.0.1:12345/trip-data/".
    pub base_url: String,
    pub stats: Arc<ServerStats>,
}

/// Starts a server in a background thread serving `files` (name -> body) under
/// `/trip-data/`. The server runs until the process exits.
pub fn start(files: HashMap<String, Vec<u8>>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let files = Arc::new(files);
    let stats = Arc::new(ServerStats::default());
    let server_stats = Arc::clone(&stats);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let files = Arc::clone(&files);
            let stats = Arc::clone(&server_stats);
            thread::spawn(move || handle(stream, &files, opts, &stats));
        }
    });
    TestServer {
        base_url: format!("http://127.0.0.1:{}/trip-data/", port),
        stats,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    files: &HashMap<String, Vec<u8>>,
    opts: ServerOptions,
    stats: &ServerStats,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, range_start) = parse_request(request);
    let name = path.strip_prefix("/trip-data/").unwrap_or("");
    let body = match files.get(name) {
        Some(b) => b.as_slice(),
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
            );
            return;
        }
    };
    let total = body.len() as u64;
    let accept_ranges = if opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            total, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
        return;
    }
    stats.gets.fetch_add(1, Ordering::SeqCst);

    let (status, content_range, slice) = match range_start.filter(|_| opts.support_ranges) {
        Some(start) if start >= total => (
            "416 Range Not Satisfiable",
            Some(format!("bytes */{}", total)),
            &body[0..0],
        ),
        Some(start) => (
            "206 Partial Content",
            Some(format!("bytes {}-{}/{}", start, total - 1, total)),
            &body[start as usize..],
        ),
        None => ("200 OK", None, body),
    };
    let content_range = content_range
        .map(|v| format!("Content-Range: {}\r\n", v))
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
    stats
        .body_bytes
        .fetch_add(slice.len() as u64, Ordering::SeqCst);
}

/// Returns (method, path, optional start of `Range: bytes=N-`).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut method = "";
    let mut path = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((a, _)) = spec.split_once('-') {
                        range = a.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, path, range)
}
