use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::api::{DISTRICT_URL, STATIC_MAP_URL};
use crate::builder::Precision;
use crate::domain::{MAX_ZOOM, MIN_ZOOM, MapSize, MapStyle};
use crate::error::MapError;

fn default_static_map_url() -> String {
    STATIC_MAP_URL.to_string()
}
fn default_district_url() -> String {
    DISTRICT_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_request_delay_ms() -> u64 {
    500
}
fn default_max_url_length() -> usize {
    8000
}
fn default_url_overhead() -> usize {
    256
}
fn default_max_stride() -> usize {
    64
}
fn default_scale() -> u8 {
    2
}
fn default_zoom_levels() -> Vec<u8> {
    vec![8, 10, 12, 14]
}
fn default_boundary() -> bool {
    true
}
fn default_labels() -> bool {
    true
}
fn default_output() -> PathBuf {
    PathBuf::from("./maps")
}

/// Provider endpoints and request limits.
///
/// Built once and handed to the downloader; nothing reads settings from
/// global state.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_static_map_url")]
    pub static_map_url: String,
    #[serde(default = "default_district_url")]
    pub district_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between consecutive image requests.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
    /// Room reserved for everything except the overlay.
    #[serde(default = "default_url_overhead")]
    pub url_overhead: usize,
    #[serde(default = "default_max_stride")]
    pub max_stride: usize,
    /// Resolution multiplier (1 or 2).
    #[serde(default = "default_scale")]
    pub scale: u8,
    /// Zoom levels used when there is neither a boundary nor a user choice.
    #[serde(default = "default_zoom_levels")]
    pub default_zoom_levels: Vec<u8>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            static_map_url: default_static_map_url(),
            district_url: default_district_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            max_url_length: default_max_url_length(),
            url_overhead: default_url_overhead(),
            max_stride: default_max_stride(),
            scale: default_scale(),
            default_zoom_levels: default_zoom_levels(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.max_stride == 0 {
            return Err(MapError::Config("max_stride must be at least 1".into()));
        }
        if !(1..=2).contains(&self.scale) {
            return Err(MapError::Config(format!(
                "scale must be 1 or 2, got {}",
                self.scale
            )));
        }
        if self.static_map_url.len() + self.url_overhead >= self.max_url_length {
            return Err(MapError::Config(format!(
                "max_url_length {} leaves no room for a request",
                self.max_url_length
            )));
        }
        validate_zoom_levels(&self.default_zoom_levels)
    }
}

pub fn validate_zoom_levels(levels: &[u8]) -> Result<(), MapError> {
    match levels.iter().find(|z| !(MIN_ZOOM..=MAX_ZOOM).contains(*z)) {
        Some(z) => Err(MapError::Config(format!(
            "zoom level {} outside {}..={}",
            z, MIN_ZOOM, MAX_ZOOM
        ))),
        None => Ok(()),
    }
}

/// Settings read from a TOML file. Command-line flags take precedence.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// AMap web service key.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub zoom: Option<Vec<u8>>,
    #[serde(default)]
    pub size: Option<MapSize>,
    #[serde(default)]
    pub style: MapStyle,
    #[serde(default)]
    pub traffic: bool,
    #[serde(default = "default_labels")]
    pub labels: bool,
    /// Draw the region boundary.
    #[serde(default = "default_boundary")]
    pub boundary: bool,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub stride: Option<usize>,
    /// Mark the administrative center.
    #[serde(default)]
    pub marker: bool,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            key: None,
            region: None,
            output: default_output(),
            zoom: None,
            size: None,
            style: MapStyle::default(),
            traffic: false,
            labels: default_labels(),
            boundary: default_boundary(),
            precision: Precision::default(),
            stride: None,
            marker: false,
            provider: ProviderConfig::default(),
        }
    }
}

impl FileConfig {
    /// Search the usual locations; the first file that parses wins.
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(config) => return Some(config),
                Err(e) => warn!("Failed to load config file {:?}: {}", path, e),
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> Result<Self, MapError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, MapError> {
        toml::from_str(contents).map_err(|e| MapError::Config(e.to_string()))
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("regionmap.toml"),
        PathBuf::from(".regionmap.toml"),
    ];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("regionmap").join("config.toml"));
        paths.push(config_dir.join("regionmap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".regionmap.toml"));
    }

    paths
}
