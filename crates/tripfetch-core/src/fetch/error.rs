//! Per-file download failure.

/// Why one target could not be fetched. Recorded per file; never aborts a batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// libcurl reported an error (timeout, connection, write abort).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Final HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer ended before the advertised size; the partial file is kept for resume.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Local file is bigger than the remote one; left untouched.
    #[error("local file has {local} bytes but remote has only {remote}")]
    LocalLarger { local: u64, remote: u64 },
    /// Disk write or metadata failure.
    #[error("storage: {0}")]
    Io(#[from] std::io::Error),
    /// External tool exited unsuccessfully (`code` is None when killed by a signal).
    #[error("{tool} exited with {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Tool { tool: &'static str, code: Option<i32> },
    /// External tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// Requested backend is not installed.
    #[error("{0} is not available on this system")]
    Unavailable(&'static str),
}
