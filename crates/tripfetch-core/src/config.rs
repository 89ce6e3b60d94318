use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Public host serving the TLC trip-record files.
pub const DEFAULT_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";

/// Which fetch capability performs the transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// External `curl`, then external `wget`, then in-process libcurl.
    #[default]
    Auto,
    /// In-process libcurl via the curl crate.
    Libcurl,
    /// External `curl` binary.
    Curl,
    /// External `wget` binary.
    Wget,
}

impl std::str::FromStr for FetchBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(FetchBackend::Auto),
            "libcurl" => Ok(FetchBackend::Libcurl),
            "curl" => Ok(FetchBackend::Curl),
            "wget" => Ok(FetchBackend::Wget),
            other => Err(format!(
                "unknown backend '{}' (expected auto, libcurl, curl or wget)",
                other
            )),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base_url '{0}' is not a valid http(s) URL")]
    BaseUrl(String),
    #[error("dataset must be non-empty and must not contain '/'")]
    Dataset,
    #[error("years must not be empty")]
    NoYears,
    #[error("year {0} is not a 4-digit year")]
    Year(u16),
    #[error("months must not be empty")]
    NoMonths,
    #[error("month {0} is outside 1..=12")]
    Month(u8),
}

/// Batch configuration loaded from `~/.config/tripfetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory URL the files are served from (no trailing filename).
    pub base_url: String,
    /// Filename prefix, e.g. `yellow_tripdata` or `green_tripdata`.
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Years to fetch, in order.
    pub years: Vec<u16>,
    /// Months to fetch for every year, in order.
    #[serde(default = "default_months")]
    pub months: Vec<u8>,
    /// Directory the files land in; created if missing.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub backend: FetchBackend,
}

fn default_dataset() -> String {
    "yellow_tripdata".to_string()
}

fn default_months() -> Vec<u8> {
    (1..=12).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset: default_dataset(),
            years: vec![2019, 2020, 2021],
            months: default_months(),
            output_dir: default_output_dir(),
            backend: FetchBackend::Auto,
        }
    }
}

impl BatchConfig {
    /// Checks every field; the batch never starts on an invalid config.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => return Err(ConfigError::BaseUrl(self.base_url.clone())),
        }
        if self.dataset.is_empty() || self.dataset.contains('/') {
            return Err(ConfigError::Dataset);
        }
        if self.years.is_empty() {
            return Err(ConfigError::NoYears);
        }
        if let Some(&y) = self.years.iter().find(|y| !(1000..=9999).contains(*y)) {
            return Err(ConfigError::Year(y));
        }
        if self.months.is_empty() {
            return Err(ConfigError::NoMonths);
        }
        if let Some(&m) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigError::Month(m));
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tripfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load and validate configuration from an explicit path. Never creates the file.
pub fn load_from_path(path: &Path) -> Result<BatchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: BatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
