use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::NormalizeOptions;

const CONFIG_DIR_NAME: &str = "dust";
const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_BASE_URL: &str = "https://dust.events/assets";
pub const DEFAULT_DATASET: &str = "ttitd-2024";

pub const ENV_DATASET: &str = "DUST_DATASET";
pub const ENV_BASE_URL: &str = "DUST_BASE_URL";
pub const ENV_DATA_DIR: &str = "DUST_DATA_DIR";
pub const ENV_HIDE_LOCATIONS: &str = "DUST_HIDE_LOCATIONS";
pub const ENV_TIME_ZONE: &str = "DUST_TIME_ZONE";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: GuideConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No usable file was found; defaults were synthesized.
    Default,
    File,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Where dataset documents come from. A data directory wins over a base URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "DatasetConfig::default_name")]
    pub name: String,
    #[serde(default)]
    pub hide_locations: bool,
    /// IANA zone name, e.g. `America/Los_Angeles`.
    #[serde(default = "DatasetConfig::default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub strict: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            hide_locations: false,
            time_zone: Self::default_time_zone(),
            strict: false,
        }
    }
}

impl DatasetConfig {
    fn default_name() -> String {
        DEFAULT_DATASET.to_string()
    }

    fn default_time_zone() -> String {
        "UTC".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Http(String),
    Directory(PathBuf),
}

impl GuideConfig {
    /// Configured zone, or UTC when the name is not a known IANA zone.
    pub fn time_zone(&self) -> Tz {
        self.dataset.time_zone.parse().unwrap_or(Tz::UTC)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            hide_locations: self.dataset.hide_locations,
            time_zone: self.time_zone(),
            strict: self.dataset.strict,
        }
    }

    pub fn source_location(&self) -> SourceLocation {
        if let Some(dir) = self.source.data_dir.as_deref().filter(|dir| !dir.trim().is_empty()) {
            return SourceLocation::Directory(expand_path(dir));
        }
        let base_url = self
            .source
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        SourceLocation::Http(base_url.to_string())
    }
}

fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}

/// Directory that holds `config.toml` and the log file.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration from `path` (or the default location) and apply
/// `DUST_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> ConfigLoadResult {
    load_config_with(path, |key| env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> ConfigLoadResult
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    let (mut config, source) = if path.exists() {
        match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str::<GuideConfig>(&raw) {
                Ok(config) => (config, ConfigSource::File),
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                    (GuideConfig::default(), ConfigSource::Default)
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
                (GuideConfig::default(), ConfigSource::Default)
            }
        }
    } else {
        (GuideConfig::default(), ConfigSource::Default)
    };

    apply_env_overrides(&mut config, &lookup, &mut warnings);
    sanitize_config(&mut config, &mut warnings);

    ConfigLoadResult {
        config,
        warnings,
        source,
    }
}

/// Write `config` as pretty TOML to `path` (or the default location).
pub fn save_config(config: &GuideConfig, path: Option<&Path>) -> Result<(), ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn apply_env_overrides<F>(config: &mut GuideConfig, lookup: &F, warnings: &mut Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(name) = read(ENV_DATASET) {
        config.dataset.name = name;
    }
    if let Some(url) = read(ENV_BASE_URL) {
        config.source.base_url = Some(url);
    }
    if let Some(dir) = read(ENV_DATA_DIR) {
        config.source.data_dir = Some(dir);
    }
    if let Some(zone) = read(ENV_TIME_ZONE) {
        config.dataset.time_zone = zone;
    }
    if let Some(raw) = read(ENV_HIDE_LOCATIONS) {
        match parse_flag(&raw) {
            Some(flag) => config.dataset.hide_locations = flag,
            None => warnings.push(format!(
                "Ignoring {ENV_HIDE_LOCATIONS}={raw}: expected true/false."
            )),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn sanitize_config(config: &mut GuideConfig, warnings: &mut Vec<String>) {
    if config.dataset.time_zone.parse::<Tz>().is_err() {
        warnings.push(format!(
            "Unknown time zone '{}'. Using UTC.",
            config.dataset.time_zone
        ));
        config.dataset.time_zone = DatasetConfig::default_time_zone();
    }
    if config.dataset.name.trim().is_empty() {
        warnings.push(format!(
            "Empty dataset name. Using {DEFAULT_DATASET}."
        ));
        config.dataset.name = DatasetConfig::default_name();
    }
}
