//! Download targets: one (year, month) pair and its derived filename and URL.

use crate::config::BatchConfig;
use std::fmt;

const EXTENSION: &str = "parquet";

/// One file of the batch. Built per iteration and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub dataset: String,
    pub year: u16,
    pub month: u8,
}

impl DownloadTarget {
    pub fn new(dataset: &str, year: u16, month: u8) -> Self {
        Self {
            dataset: dataset.to_string(),
            year,
            month,
        }
    }

    /// `{dataset}_{YYYY}-{MM}.parquet`, month zero-padded to two digits.
    pub fn filename(&self) -> String {
        format!(
            "{}_{:04}-{:02}.{}",
            self.dataset, self.year, self.month, EXTENSION
        )
    }

    /// `{base}/{filename}` with exactly one separator between them.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.filename())
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:04}-{:02}", self.dataset, self.year, self.month)
    }
}

/// Cartesian product of configured years and months: years outer, months inner.
pub fn plan_targets(cfg: &BatchConfig) -> Vec<DownloadTarget> {
    cfg.years
        .iter()
        .flat_map(|&year| {
            cfg.months
                .iter()
                .map(move |&month| DownloadTarget::new(&cfg.dataset, year, month))
        })
        .collect()
}
