//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//! Every default matches the stock counter behavior, so an empty file
//! (or no file at all) is a complete configuration.

use crate::counter::{IncrementPolicy, PolicyConfig, DEFAULT_SUFFIX};
use crate::render::{Selector, DEFAULT_SELECTOR};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key-value store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_data_file() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("viewcount").join("views.json").to_string_lossy().to_string())
        .unwrap_or_else(|| "./viewcount_data/views.json".to_string())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

impl StoreConfig {
    /// Data file path with a leading `~/` expanded
    pub fn data_path(&self) -> PathBuf {
        expand_home(&self.data_file)
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_selector")]
    pub selector: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            suffix: default_suffix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// The first config file that exists wins. A file that exists but
    /// fails to load is an error, not a silent fallback to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("viewcount").join("config.toml")),
            Some(PathBuf::from("/etc/viewcount/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        match Self::load_first(&config_paths)? {
            Some(config) => Ok(config),
            None => {
                // Fall back to environment-only config
                tracing::info!("Using default config with environment overrides");
                Ok(Self::from_env())
            }
        }
    }

    /// Load the first of `paths` that exists, with environment overrides
    pub fn load_first(paths: &[PathBuf]) -> Result<Option<Self>, ConfigError> {
        let Some(path) = paths.iter().find(|p| p.exists()) else {
            return Ok(None);
        };

        let config = Self::load_with_env(path)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(Some(config))
    }

    /// Check the policy and selector
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate().map_err(ConfigError::Invalid)?;
        Selector::parse(&self.render.selector)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Build the increment policy described by `[policy]`
    pub fn increment_policy(&self) -> Result<IncrementPolicy, ConfigError> {
        IncrementPolicy::new(self.policy.clone()).map_err(ConfigError::Invalid)
    }

    /// Parse the `[render] selector`
    pub fn selector(&self) -> Result<Selector, ConfigError> {
        Selector::parse(&self.render.selector).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Store overrides
        if let Some(data_file) = var("VIEWCOUNT_DATA_FILE") {
            self.store.data_file = data_file;
        }

        // Render overrides
        if let Some(selector) = var("VIEWCOUNT_SELECTOR") {
            self.render.selector = selector;
        }

        // Logging overrides
        if let Some(level) = var("VIEWCOUNT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("VIEWCOUNT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Viewcount Configuration
#
# Environment variables override these settings:
# - VIEWCOUNT_DATA_FILE
# - VIEWCOUNT_SELECTOR
# - VIEWCOUNT_LOG_LEVEL
# - VIEWCOUNT_LOG_FORMAT

[store]
# JSON file holding every page's counter records
data_file = "~/.local/share/viewcount/views.json"

[policy]
# Starting counts for a page seen for the first time (one is picked at random)
seed_views = [5000, 6000, 7000]

# Reloads closer together than this are quick reloads (ms)
reload_threshold_ms = 30000

# Increment for a quick reload
quick_reload_increment = 1

# Increments for a delayed reload (one is picked at random)
delayed_reload_increments = [2, 3, 5]

# Length of one catch-up interval while the page was closed (ms)
catch_up_interval_ms = 2000

# Per-interval increments for catch-up (one is picked for all intervals)
catch_up_increments = [1, 2]

# Probability that an updater tick uses the short branch
short_branch_weight = 0.4

# Short branch: wait range (ms, inclusive) and increments
short_interval_ms = [2000, 10000]
short_increments = [1, 2]

# Long branch: wait range (ms, inclusive) and increments
long_interval_ms = [11000, 20000]
long_increments = [1, 2, 3]

[render]
# Class selector of the element showing the count
selector = ".views-count"

# Text after the formatted count
suffix = " views"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
