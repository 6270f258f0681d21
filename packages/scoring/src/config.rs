//! Pipeline configuration.
//!
//! [`ScoringConfig`] is read from a TOML file named by
//! [`CONFIG_PATH_ENV`], falling back to [`DEFAULT_CONFIG_PATH`]. Every
//! field has a default, so a missing file or a partial file is fine. The
//! Google API key is never part of the file; it is read from
//! [`API_KEY_ENV`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike as _, Utc};
use livability_house::forest::ForestParams;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LIVABILITY_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "livability.toml";

/// Environment variable holding the Google Maps API key.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ScoringConfig`].
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A required environment variable is unset or empty.
    #[error("{name} environment variable not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
}

/// File names of the reference datasets, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatasetFiles {
    /// Per-district crime incident counts.
    pub crime: String,
    /// Per-district yearly totals across all disasters.
    pub all_disasters: String,
    /// Per-district yearly earthquake records.
    pub earthquakes: String,
    /// Per-district yearly flood records.
    pub floods: String,
    /// Per-district yearly cyclone records.
    pub cyclones: String,
    /// Historical house sales.
    pub sales: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            crime: "crime_data.csv".to_string(),
            all_disasters: "all_disasters.csv".to_string(),
            earthquakes: "Earthquakes.csv".to_string(),
            floods: "Floods.csv".to_string(),
            cyclones: "Cyclones.csv".to_string(),
            sales: "house.csv".to_string(),
        }
    }
}

/// Settings for building and serving the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Directory holding the reference datasets.
    pub data_dir: PathBuf,
    /// Dataset file names.
    pub datasets: DatasetFiles,
    /// Directory rendered maps are written to.
    pub map_output_dir: PathBuf,
    /// Directory maps are published to for serving.
    pub publish_dir: PathBuf,
    /// Timeout for each outbound HTTP request.
    pub request_timeout_secs: u64,
    /// Year that sale and build dates are measured from. Defaults to the
    /// current UTC year.
    pub reference_year: Option<i32>,
    /// Price model hyper-parameters.
    pub forest: ForestParams,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            datasets: DatasetFiles::default(),
            map_output_dir: PathBuf::from("data/maps"),
            publish_dir: PathBuf::from("static"),
            request_timeout_secs: 30,
            reference_year: None,
            forest: ForestParams::default(),
        }
    }
}

impl ScoringConfig {
    /// Loads the config file named by [`CONFIG_PATH_ENV`], or
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load(&path)
    }

    /// Loads a config file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}; using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = toml::de::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Full path of a dataset file.
    #[must_use]
    pub fn dataset_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Year dates are measured from.
    #[must_use]
    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Outbound HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads the Google Maps API key from [`API_KEY_ENV`].
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] if the variable is unset or empty.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingEnv { name: API_KEY_ENV })
}
