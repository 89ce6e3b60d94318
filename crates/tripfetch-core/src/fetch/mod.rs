//! Fetch capability: one resumable HTTP GET of a URL into a local file.
//!
//! The batch loop only sees the `Fetcher` trait. Backends are in-process
//! libcurl and the external `curl` / `wget` binaries; `select` picks one at
//! startup by probing what is available.

mod error;
pub mod head;
mod libcurl;
mod progress;
mod select;
mod tool;

use std::fmt;
use std::path::Path;

pub use error::FetchError;
pub use libcurl::LibcurlFetcher;
pub use select::{select, tool_available};
pub use tool::{Tool, ToolFetcher};

/// What a successful fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Whole file transferred from offset 0.
    Downloaded { bytes: u64 },
    /// Partial file continued from `from`; `bytes` is the final size.
    Resumed { from: u64, bytes: u64 },
    /// Local file already had the full remote size; nothing transferred.
    AlreadyComplete { size: u64 },
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Downloaded { bytes } => write!(f, "downloaded {} bytes", bytes),
            FetchOutcome::Resumed { from, bytes } => {
                write!(f, "resumed at {} ({} bytes total)", from, bytes)
            }
            FetchOutcome::AlreadyComplete { size } => write!(f, "already complete ({} bytes)", size),
        }
    }
}

/// A capability that downloads `url` into `dest`, resuming a partial `dest`
/// and leaving a complete one alone.
pub trait Fetcher {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError>;
}

/// What a HEAD request says about the file already at `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precheck {
    /// Local file already has the full remote size.
    Complete(u64),
    /// A transfer is needed; `remote` is the size from HEAD, if the server sent one.
    Transfer { remote: Option<u64> },
}

/// HEAD `url` and compare against `local` bytes at `dest`.
///
/// A failed HEAD is not fatal: the GET decides. A local file bigger than the
/// remote one is an error and must be left alone.
pub(crate) fn precheck(url: &str, dest: &Path, local: u64) -> Result<Precheck, FetchError> {
    let probed = match head::probe(url) {
        Ok(h) => Some(h),
        Err(e) => {
            tracing::debug!(%url, error = %e, "HEAD probe failed; relying on GET");
            None
        }
    };
    let remote = probed.as_ref().and_then(|h| h.content_length);

    if let Some(remote) = remote {
        if local == remote && dest.exists() {
            return Ok(Precheck::Complete(local));
        }
        if local > remote {
            return Err(FetchError::LocalLarger { local, remote });
        }
    }
    if local > 0 {
        if probed.as_ref().is_some_and(|h| !h.accept_ranges) {
            tracing::debug!(
                "{} does not advertise byte ranges; {} may be rewritten from the start",
                url,
                dest.display()
            );
        } else {
            tracing::debug!("resuming {} at byte {}", dest.display(), local);
        }
    }
    Ok(Precheck::Transfer { remote })
}

/// Current length of `path`, or 0 if it does not exist.
pub(crate) fn local_len(path: &Path) -> Result<u64, FetchError> {
    match std::fs::metadata(path) {
        Ok(m) => Ok(m.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(FetchError::Io(e)),
    }
}
