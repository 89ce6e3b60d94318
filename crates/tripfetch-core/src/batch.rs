//! Sequential batch fetcher.
//!
//! Walks every configured (year, month) pair, fetches one file at a time and
//! records each result. A failed file is logged and the loop moves on; the
//! next run resumes or skips whatever is already on disk.

use crate::config::BatchConfig;
use crate::fetch::{FetchError, FetchOutcome, Fetcher};
use crate::target::{plan_targets, DownloadTarget};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;

/// Result for one target of the batch.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: DownloadTarget,
    pub filename: String,
    pub url: String,
    pub result: Result<FetchOutcome, FetchError>,
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-target results in iteration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Runs the whole batch, writing the human-readable transcript to `out`.
///
/// Only a failure to create the output directory is returned as an error;
/// per-file failures end up in the report.
pub fn run_batch(
    cfg: &BatchConfig,
    fetcher: &dyn Fetcher,
    out: &mut dyn Write,
) -> Result<BatchReport> {
    fs::create_dir_all(&cfg.output_dir).with_context(|| {
        format!("failed to create output directory {}", cfg.output_dir.display())
    })?;

    let targets = plan_targets(cfg);
    tracing::info!(
        targets = targets.len(),
        backend = fetcher.name(),
        dir = %cfg.output_dir.display(),
        "starting batch"
    );

    let mut report = BatchReport::default();
    for target in targets {
        let filename = target.filename();
        let url = target.url(&cfg.base_url);
        let dest = cfg.output_dir.join(&filename);

        emit(out, &format!("Downloading {}...", filename));
        tracing::debug!(%url, dest = %dest.display(), "fetching");

        let result = fetcher.fetch(&url, &dest);
        match &result {
            Ok(outcome) => {
                tracing::info!(file = %filename, "{}", outcome);
                emit(out, &format!("Successfully downloaded {}", filename));
            }
            Err(e) => {
                tracing::warn!(file = %filename, %url, error = %e, "download failed");
                emit(out, &format!("Failed to download {}", filename));
            }
        }

        report.outcomes.push(TargetOutcome {
            target,
            filename,
            url,
            result,
        });
    }

    emit(out, "Download complete.");
    tracing::info!(
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        "batch finished"
    );
    Ok(report)
}

/// Writes one transcript line; a broken sink never stops the batch.
fn emit(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
        tracing::debug!("transcript write failed: {}", e);
    }
}
