use serde::{Deserialize, Serialize};

use crate::favorites::BatchPolicy;

pub const BACKEND_URL_ENV: &str = "FAVREEL_BACKEND_URL";
pub const TMDB_API_KEY_ENV: &str = "FAVREEL_TMDB_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

/// The favorites backend. `base_url` is what the web client knew as the
/// base API URL.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BackendConfig {
    #[serde(default, alias = "baseurl")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default, alias = "apikey")]
    pub api_key: String,
    #[serde(default = "default_tmdb_base_url", alias = "baseurl")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_image_base_url", alias = "imagebaseurl")]
    pub image_base_url: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tmdb_base_url(),
            language: default_language(),
            image_base_url: default_image_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub policy: BatchPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            policy: BatchPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarouselConfig {
    /// How many favorites, from the top of the list, go into the carousel.
    #[serde(default = "default_carousel_size")]
    pub size: usize,
    /// Number of index-selector dots rendered under the poster.
    #[serde(default = "default_selectors")]
    pub selectors: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            size: default_carousel_size(),
            selectors: default_selectors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w300".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_carousel_size() -> usize {
    10
}

fn default_selectors() -> usize {
    3
}

fn default_idle_ttl_secs() -> u64 {
    1800
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let mut config = Self::parse(path, &content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn parse(origin: &str, content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(origin.to_string(), e))
    }

    /// Secrets may come from the environment instead of the config file.
    /// This is the only place the environment is consulted.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(key) = lookup(TMDB_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.tmdb.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("backend.base_url", BACKEND_URL_ENV));
        }
        if self.tmdb.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("tmdb.api_key", TMDB_API_KEY_ENV));
        }
        if self.carousel.size == 0 {
            return Err(ConfigError::Invalid("carousel.size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Missing required setting {0} (or environment variable {1})")]
    Missing(&'static str, &'static str),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}
