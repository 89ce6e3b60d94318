//! In-process resumable GET via libcurl.
//!
//! HEAD first to learn the remote size, then a `Range: bytes=N-` GET that
//! appends to whatever is already on disk. Bodies of error responses are
//! never written, so an existing file is only ever extended or, when the
//! server ignores the range, rewritten with the full body.

use super::head::{content_range_start, content_range_total, status_code};
use super::progress::ProgressMeter;
use super::{local_len, precheck, FetchError, FetchOutcome, Fetcher, Precheck};
use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

/// Fetcher backed by the curl crate. Always available.
#[derive(Debug, Clone)]
pub struct LibcurlFetcher {
    show_progress: bool,
    connect_timeout: Duration,
}

impl Default for LibcurlFetcher {
    fn default() -> Self {
        Self {
            show_progress: true,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl LibcurlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the stderr progress meter (tests, non-tty use).
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Resumable GET of `url` into `dest`, which currently holds `local` bytes.
    fn get(
        &self,
        url: &str,
        dest: &Path,
        local: u64,
        remote: Option<u64>,
    ) -> Result<FetchOutcome, FetchError> {
        let status: Cell<Option<u32>> = Cell::new(None);
        let content_range: RefCell<Option<String>> = RefCell::new(None);
        let file: RefCell<Option<File>> = RefCell::new(None);
        let abort: RefCell<Option<FetchError>> = RefCell::new(None);
        let meter = RefCell::new(ProgressMeter::new(local));

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Abort if throughput drops below 1 KiB/s for 60s.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        if local > 0 {
            easy.range(&format!("{}-", local))?;
        }
        easy.progress(self.show_progress)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    let line = line.trim_end();
                    if let Some(code) = status_code(line) {
                        status.set(Some(code));
                        content_range.replace(None);
                    } else if let Some((name, value)) = line.split_once(':') {
                        if name.trim().eq_ignore_ascii_case("content-range") {
                            content_range.replace(Some(value.trim().to_string()));
                        }
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                let code = status.get();
                if !matches!(code, Some(200) | Some(206)) {
                    // Error page body; discard.
                    return Ok(data.len());
                }
                let mut slot = file.borrow_mut();
                if slot.is_none() {
                    let opened = open_for_response(
                        dest,
                        code == Some(206),
                        local,
                        content_range.borrow().as_deref(),
                    );
                    match opened {
                        Ok(f) => *slot = Some(f),
                        Err(e) => {
                            abort.replace(Some(e));
                            return Ok(0);
                        }
                    }
                }
                let Some(f) = slot.as_mut() else {
                    return Ok(0);
                };
                match f.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        tracing::warn!("write to {} failed: {}", dest.display(), e);
                        abort.replace(Some(FetchError::Io(e)));
                        Ok(0)
                    }
                }
            })?;
            if self.show_progress {
                transfer.progress_function(|dltotal, dlnow, _, _| {
                    meter.borrow_mut().update(dlnow, dltotal);
                    true
                })?;
            }
            transfer.perform()
        };
        meter.borrow().finish();

        if let Err(e) = performed {
            if e.is_write_error() {
                if let Some(reason) = abort.take() {
                    return Err(reason);
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        let range_total = content_range.borrow().as_deref().and_then(content_range_total);
        match code {
            206 | 200 => {
                // Empty 200 body: the write callback never ran.
                let opened = file.borrow().is_some();
                if !opened {
                    open_for_response(dest, code == 206, local, None)?;
                }
                drop(file.take());
                let size = local_len(dest)?;
                if let Some(expected) = remote.or(range_total) {
                    if size != expected {
                        return Err(FetchError::PartialTransfer {
                            expected,
                            received: size,
                        });
                    }
                }
                if code == 206 {
                    Ok(FetchOutcome::Resumed { from: local, bytes: size })
                } else {
                    Ok(FetchOutcome::Downloaded { bytes: size })
                }
            }
            416 if local > 0 && range_total == Some(local) => {
                Ok(FetchOutcome::AlreadyComplete { size: local })
            }
            _ => Err(FetchError::Http(code)),
        }
    }
}

/// Opens `dest` for the body of a 200 (truncate) or 206 (append at `local`).
fn open_for_response(
    dest: &Path,
    partial: bool,
    local: u64,
    content_range: Option<&str>,
) -> Result<File, FetchError> {
    if partial {
        if let Some(start) = content_range.and_then(content_range_start) {
            if start != local {
                return Err(FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("server resumed at byte {} instead of {}", start, local),
                )));
            }
        }
        Ok(OpenOptions::new().create(true).append(true).open(dest)?)
    } else {
        Ok(File::create(dest)?)
    }
}

impl Fetcher for LibcurlFetcher {
    fn name(&self) -> &'static str {
        "libcurl"
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        let local = local_len(dest)?;
        let remote = match precheck(url, dest, local)? {
            Precheck::Complete(size) => return Ok(FetchOutcome::AlreadyComplete { size }),
            Precheck::Transfer { remote } => remote,
        };

        self.get(url, dest, local, remote)
    }
}
