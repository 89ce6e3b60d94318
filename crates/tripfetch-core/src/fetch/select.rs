//! Startup probe that picks the fetch backend.

use super::{FetchError, Fetcher, LibcurlFetcher, Tool, ToolFetcher};
use crate::config::FetchBackend;
use std::process::{Command, Stdio};

/// True if `<tool> --version` runs and exits successfully.
pub fn tool_available(tool: Tool) -> bool {
    Command::new(tool.program())
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Builds the fetcher for `backend`, probing external tools once.
///
/// `Auto` prefers external `curl`, then `wget`, then in-process libcurl.
pub fn select(backend: FetchBackend) -> Result<Box<dyn Fetcher>, FetchError> {
    select_with(backend, tool_available)
}

fn select_with(
    backend: FetchBackend,
    available: impl Fn(Tool) -> bool,
) -> Result<Box<dyn Fetcher>, FetchError> {
    let fetcher: Box<dyn Fetcher> = match backend {
        FetchBackend::Libcurl => Box::new(LibcurlFetcher::new()),
        FetchBackend::Curl | FetchBackend::Wget => {
            let tool = if backend == FetchBackend::Curl {
                Tool::Curl
            } else {
                Tool::Wget
            };
            if !available(tool) {
                return Err(FetchError::Unavailable(tool.program()));
            }
            Box::new(ToolFetcher::new(tool))
        }
        FetchBackend::Auto => match [Tool::Curl, Tool::Wget].into_iter().find(|t| available(*t)) {
            Some(tool) => Box::new(ToolFetcher::new(tool)),
            None => Box::new(LibcurlFetcher::new()),
        },
    };
    tracing::info!(backend = fetcher.name(), "selected fetch backend");
    Ok(fetcher)
}
