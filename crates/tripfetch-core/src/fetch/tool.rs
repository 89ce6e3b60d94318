//! External download tools (`curl`, `wget`) driven as child processes.
//!
//! Both are run in their resume mode with a progress bar and no other
//! chatter. A partial or complete local file is checked with HEAD first:
//! curl exits non-zero on the 416 a complete file provokes, so complete
//! files never reach the tool.

use super::{local_len, precheck, FetchError, FetchOutcome, Fetcher, Precheck};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

/// Which binary to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Curl,
    Wget,
}

impl Tool {
    pub fn program(self) -> &'static str {
        match self {
            Tool::Curl => "curl",
            Tool::Wget => "wget",
        }
    }

    /// Arguments for a resumable, quiet-with-progress download of `url` into `dest`.
    pub fn args(self, url: &str, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = match self {
            Tool::Curl => vec![
                "--location".into(),
                "--continue-at".into(),
                "-".into(),
                "--fail".into(),
                "--progress-bar".into(),
                "--output".into(),
                dest.as_os_str().to_owned(),
            ],
            Tool::Wget => {
                let mut output = OsString::from("--output-document=");
                output.push(dest.as_os_str());
                vec![
                    "--continue".into(),
                    "--quiet".into(),
                    "--show-progress".into(),
                    output,
                ]
            }
        };
        args.push(url.into());
        args
    }
}

/// Fetcher that shells out to `curl` or `wget`.
#[derive(Debug, Clone, Copy)]
pub struct ToolFetcher {
    tool: Tool,
}

impl ToolFetcher {
    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }
}

impl Fetcher for ToolFetcher {
    fn name(&self) -> &'static str {
        self.tool.program()
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        let program = self.tool.program();
        let before = local_len(dest)?;
        if before > 0 {
            if let Precheck::Complete(size) = precheck(url, dest, before)? {
                return Ok(FetchOutcome::AlreadyComplete { size });
            }
        }
        // stdout stays clean for the transcript; progress goes to the inherited stderr.
        let status = Command::new(program)
            .args(self.tool.args(url, dest))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| FetchError::Spawn { tool: program, source })?;

        if !status.success() {
            if let Err(e) = discard_empty_output(dest, before) {
                tracing::debug!("could not remove empty {}: {}", dest.display(), e);
            }
            return Err(FetchError::Tool {
                tool: program,
                code: status.code(),
            });
        }

        let bytes = local_len(dest)?;
        Ok(match before {
            0 => FetchOutcome::Downloaded { bytes },
            b if b == bytes => FetchOutcome::AlreadyComplete { size: bytes },
            from => FetchOutcome::Resumed { from, bytes },
        })
    }
}

/// Removes a 0-byte `dest` left by a failed first attempt.
///
/// wget creates the output document before it sees the HTTP status, so a 404
/// would otherwise leave an empty file that looks like a partial download.
fn discard_empty_output(dest: &Path, before: u64) -> Result<(), FetchError> {
    if before == 0 && dest.exists() && local_len(dest)? == 0 {
        std::fs::remove_file(dest)?;
    }
    Ok(())
}
