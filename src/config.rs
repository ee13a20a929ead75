//! # Dashboard Configuration
//!
//! Backend location, endpoint paths, polling cadence, download directory and
//! camera stream are all injected through this config instead of being
//! hard-coded.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://octo.local:8000"
//! request_timeout_ms = 3000
//!
//! [backend.endpoints]
//! pause = "/dashboard/pause"
//!
//! [polling]
//! interval_ms = 1000
//! telemetry_capacity = 20
//!
//! [downloads]
//! directory = "./downloads"
//! ```
//!
//! Any section or key left out falls back to its default.

// src/config.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the dashboard.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub downloads: DownloadConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

/// Where the printer backend lives and how to reach it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub endpoints: EndpointMap,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            endpoints: EndpointMap::default(),
        }
    }
}

impl BackendConfig {
    /// Join the base URL and an endpoint path without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Endpoint paths, relative to the backend base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointMap {
    #[serde(default = "default_printer_status")]
    pub printer_status: String,
    #[serde(default = "default_jobs")]
    pub jobs: String,
    #[serde(default = "default_last_valid")]
    pub last_valid: String,
    #[serde(default = "default_next_valid")]
    pub next_valid: String,
    #[serde(default = "default_pause")]
    pub pause: String,
    #[serde(default = "default_preheat")]
    pub preheat: String,
    #[serde(default = "default_resume")]
    pub resume: String,
    #[serde(default = "default_cancel")]
    pub cancel: String,
    #[serde(default = "default_rate_job")]
    pub rate_job: String,
    #[serde(default = "default_timelapse")]
    pub timelapse: String,
    #[serde(default = "default_picture_history")]
    pub picture_history: String,
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self {
            printer_status: default_printer_status(),
            jobs: default_jobs(),
            last_valid: default_last_valid(),
            next_valid: default_next_valid(),
            pause: default_pause(),
            preheat: default_preheat(),
            resume: default_resume(),
            cancel: default_cancel(),
            rate_job: default_rate_job(),
            timelapse: default_timelapse(),
            picture_history: default_picture_history(),
        }
    }
}

impl EndpointMap {
    fn entries(&self) -> [(&'static str, &str); 11] {
        [
            ("printer_status", self.printer_status.as_str()),
            ("jobs", self.jobs.as_str()),
            ("last_valid", self.last_valid.as_str()),
            ("next_valid", self.next_valid.as_str()),
            ("pause", self.pause.as_str()),
            ("preheat", self.preheat.as_str()),
            ("resume", self.resume.as_str()),
            ("cancel", self.cancel.as_str()),
            ("rate_job", self.rate_job.as_str()),
            ("timelapse", self.timelapse.as_str()),
            ("picture_history", self.picture_history.as_str()),
        ]
    }
}

/// Poll cadence and chart window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_telemetry_capacity")]
    pub telemetry_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            telemetry_capacity: default_telemetry_capacity(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
        }
    }
}

/// Live camera feed. Without an explicit URL the backend's `/dashboard/camera` is used.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub stream_url: Option<String>,
}

impl DashboardConfig {
    /// Config pointing at `base_url` with every other value defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.backend.base_url = base_url.into();
        config
    }

    pub fn camera_url(&self) -> String {
        match &self.camera.stream_url {
            Some(url) => url.clone(),
            None => self.backend.url("/dashboard/camera"),
        }
    }

    /// Validate config (base URL, cadence, capacity, endpoint paths)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.base_url must not be empty".to_string()));
        }
        if self.backend.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("backend.request_timeout_ms must be > 0".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid("polling.interval_ms must be > 0".to_string()));
        }
        if self.polling.telemetry_capacity == 0 {
            return Err(ConfigError::Invalid("polling.telemetry_capacity must be > 0".to_string()));
        }
        for (name, path) in self.backend.endpoints.entries() {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "Endpoint '{}' must start with '/', got '{}'",
                    name, path
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_request_timeout_ms() -> u64 { 5000 }
fn default_printer_status() -> String { "/dashboard/printer-status".to_string() }
fn default_jobs() -> String { "/dashboard/jobs".to_string() }
fn default_last_valid() -> String { "/dashboard/last-valid".to_string() }
fn default_next_valid() -> String { "/dashboard/next-valid".to_string() }
fn default_pause() -> String { "/dashboard/pause".to_string() }
fn default_preheat() -> String { "/dashboard/preheat".to_string() }
fn default_resume() -> String { "/dashboard/continue".to_string() }
fn default_cancel() -> String { "/dashboard/cancel".to_string() }
fn default_rate_job() -> String { "/dashboard/rate-job".to_string() }
fn default_timelapse() -> String { "/dashboard/timelapse".to_string() }
fn default_picture_history() -> String { "/dashboard/pictureHistory".to_string() }
fn default_interval_ms() -> u64 { 1000 }
fn default_telemetry_capacity() -> usize { 20 }
fn default_download_dir() -> PathBuf { PathBuf::from(".") }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<DashboardConfig, ConfigError> {
    let config: DashboardConfig = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}
