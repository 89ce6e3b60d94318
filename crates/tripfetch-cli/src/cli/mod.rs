//! CLI for tripfetch. With no arguments it runs the configured batch.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tripfetch_core::batch;
use tripfetch_core::config::{self, BatchConfig, FetchBackend};
use tripfetch_core::fetch;

/// Download NYC TLC trip-record Parquet files, resuming partial files and
/// skipping complete ones.
#[derive(Debug, Parser)]
#[command(name = "tripfetch")]
#[command(about = "Resumable batch download of NYC TLC trip-record files", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/tripfetch/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Fetch backend: auto, libcurl, curl or wget (overrides the config file).
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<FetchBackend>,

    /// Directory to write files into (overrides the config file).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<BatchConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        if let Some(backend) = self.backend {
            cfg.backend = backend;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = cli.resolve_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let fetcher = fetch::select(cfg.backend).context("no usable fetch backend")?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let report = batch::run_batch(&cfg, fetcher.as_ref(), &mut out)?;

        for failed in report.failed() {
            if let Err(e) = &failed.result {
                tracing::warn!("{} not downloaded: {}", failed.filename, e);
            }
        }
        tracing::info!(
            "run completed: {} of {} file(s) ok",
            report.succeeded(),
            report.attempted()
        );
        Ok(())
    }
}
