use reqwest::header::HeaderMap;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;
use url::Url;

use crate::fetch::{build_headers, HeaderError};

pub const CONFIG_PATH_ENV: &str = "JSONAPI_SENSOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "sensors.yaml";
pub const DEFAULT_NAME: &str = "JSON API Sensor";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("sensor `{name}`: invalid url `{url}`: {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },
    #[error("sensor `{name}`: scan_interval must be positive")]
    ZeroInterval { name: String },
    #[error("sensor `{name}`: {source}")]
    Header {
        name: String,
        #[source]
        source: HeaderError,
    },
    #[error("duplicate sensor name `{0}`")]
    DuplicateName(String),
    #[error("no sensors configured")]
    NoSensors,
}

/// Raw file layout, before defaults are checked and URLs parsed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuntimeFile {
    #[serde(default = "default_listen")]
    listen: SocketAddr,
    #[serde(default)]
    sensors: Vec<SensorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorEntry {
    pub url: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_scan_interval", deserialize_with = "deserialize_interval")]
    pub scan_interval: Duration,
    #[serde(default)]
    pub attributes_template: Option<String>,
}

impl SensorEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: default_name(),
            authorization: None,
            headers: BTreeMap::new(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            attributes_template: None,
        }
    }
}

/// Validated, immutable configuration of one sensor.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub name: String,
    pub url: Url,
    pub authorization: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub scan_interval: Duration,
    pub attributes_template: Option<String>,
    /// Configured headers with the authorization override applied.
    pub request_headers: HeaderMap,
}

impl TryFrom<SensorEntry> for SensorConfig {
    type Error = ConfigError;

    fn try_from(entry: SensorEntry) -> Result<Self, Self::Error> {
        let url = parse_url(&entry.url).map_err(|reason| ConfigError::InvalidUrl {
            name: entry.name.clone(),
            url: entry.url.clone(),
            reason,
        })?;

        if entry.scan_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: entry.name });
        }

        let request_headers = build_headers(&entry.headers, entry.authorization.as_deref())
            .map_err(|source| ConfigError::Header {
                name: entry.name.clone(),
                source,
            })?;

        Ok(SensorConfig {
            name: entry.name,
            url,
            authorization: entry.authorization,
            headers: entry.headers,
            scan_interval: entry.scan_interval,
            attributes_template: entry.attributes_template,
            request_headers,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub listen: SocketAddr,
    pub sensors: Vec<SensorConfig>,
}

impl RuntimeConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let file: RuntimeFile = serde_yaml::from_str(text)?;
        if file.sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }

        let mut seen = HashSet::new();
        let mut sensors = Vec::with_capacity(file.sensors.len());
        for entry in file.sensors {
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::DuplicateName(entry.name));
            }
            sensors.push(SensorConfig::try_from(entry)?);
        }

        Ok(Self {
            listen: file.listen,
            sensors,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), sensors = config.sensors.len(), "configuration loaded");
        Ok(config)
    }
}

/// Config path from `JSONAPI_SENSOR_CONFIG`, falling back to `sensors.yaml`.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into())
        .into()
}

fn parse_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err("missing host".into()),
        other => Err(format!("unsupported scheme `{other}`")),
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_scan_interval() -> Duration {
    DEFAULT_SCAN_INTERVAL
}

/// Accepts either whole seconds (`300`) or a humantime string (`5m`, `1h 30s`).
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Interval {
        Seconds(u64),
        Text(String),
    }

    match Interval::deserialize(deserializer)? {
        Interval::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Interval::Text(text) => {
            humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
        }
    }
}
