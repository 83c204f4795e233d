use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_DELAY_IN_SECONDS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_IN_SECONDS: u64 = 30;

pub const ENV_BASE_URL: &str = "WEATHER_API_BASE_URL";
pub const ENV_USER_NAME: &str = "WEATHER_API_USER_NAME";
pub const ENV_DELAY_IN_SECONDS: &str = "WEATHER_API_DELAY_IN_SECONDS";

/// Connection settings for the weather API.
///
/// Example TOML:
/// ```toml
/// [weather_api]
/// base_url = "https://weather-api.example"
/// user_name = "isun"
/// delay_in_seconds = 15
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub user_name: String,
    pub delay_in_seconds: u64,
    pub request_timeout_in_seconds: u64,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_name: String::new(),
            delay_in_seconds: DEFAULT_DELAY_IN_SECONDS,
            request_timeout_in_seconds: DEFAULT_REQUEST_TIMEOUT_IN_SECONDS,
        }
    }
}

impl WeatherApiConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_in_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_in_seconds)
    }
}

/// Where observations are appended, if anywhere besides memory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather_api: WeatherApiConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load config from `path`, or from the platform config directory.
    ///
    /// An explicitly given file must exist. A missing default file yields an
    /// empty config, which [`Config::validate`] then rejects unless the
    /// environment fills in the required values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_file_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-poller", "weather-poller")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with `WEATHER_API_*` variables looked up via `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.weather_api.base_url = url;
        }
        if let Some(user) = lookup(ENV_USER_NAME) {
            self.weather_api.user_name = user;
        }
        if let Some(delay) = lookup(ENV_DELAY_IN_SECONDS) {
            self.weather_api.delay_in_seconds = delay
                .trim()
                .parse()
                .with_context(|| {
                    format!("{ENV_DELAY_IN_SECONDS} must be a positive integer, got '{delay}'")
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let api = &self.weather_api;

        if api.base_url.trim().is_empty() {
            bail!(
                "weather_api.base_url is not configured.\n\
                 Hint: set it in {} or via {ENV_BASE_URL}.",
                Self::config_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_owned())
            );
        }
        Url::parse(&api.base_url).with_context(|| {
            format!("weather_api.base_url '{}' is not a valid URL", api.base_url)
        })?;

        if api.user_name.trim().is_empty() {
            bail!("weather_api.user_name is not configured. Hint: set it or use {ENV_USER_NAME}.");
        }
        if api.delay_in_seconds == 0 {
            bail!("weather_api.delay_in_seconds must be a positive integer");
        }
        if api.request_timeout_in_seconds == 0 {
            bail!("weather_api.request_timeout_in_seconds must be a positive integer");
        }

        Ok(())
    }
}
