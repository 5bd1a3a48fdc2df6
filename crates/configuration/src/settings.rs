use crate::error::ConfigError;
use core_types::{DEFAULT_HISTOGRAM_BINS, DEFAULT_Z_THRESHOLD, MAX_HISTOGRAM_BINS};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; missing sections fall back to their
/// `Default` implementation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub analysis: AnalysisDefaults,
    pub report: ReportSettings,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects settings that would make the engines or the client misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.analysis.z_threshold.is_finite() || self.analysis.z_threshold <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.z_threshold must be a positive number, got {}",
                self.analysis.z_threshold
            )));
        }
        if !(1..=MAX_HISTOGRAM_BINS).contains(&self.analysis.histogram_bins) {
            return Err(ConfigError::ValidationError(format!(
                "analysis.histogram_bins must be between 1 and {MAX_HISTOGRAM_BINS}, got {}",
                self.analysis.histogram_bins
            )));
        }
        if self.remote.enabled && self.remote.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "remote.base_url must be set when the remote path is enabled".to_string(),
            ));
        }
        if self.remote.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "remote.timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the remote analysis service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// When false, every analysis runs on the local engines.
    pub enabled: bool,
    /// Base URL of the analysis backend, e.g. "http://localhost:5000".
    pub base_url: String,
    /// Per-call timeout. A timeout is treated like any other remote failure.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Options applied when a request or report does not specify its own.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    pub z_threshold: f64,
    pub histogram_bins: usize,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Where report series are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// `{data_dir}/{source_id}.csv` on the local disk.
    File,
    /// `GET {remote.base_url}/api/data/{source_id}`.
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub include_charts: bool,
    pub data_source: DataSourceKind,
    pub data_dir: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            include_charts: true,
            data_source: DataSourceKind::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "insight.log".to_string(),
        }
    }
}
