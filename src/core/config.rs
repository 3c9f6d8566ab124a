//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::analysis::pagination::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, RULE_SCAN_PAGE_SIZE};
use crate::analysis::AnalysisSettings;
use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::api::ClientConfig;

/// Local config file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".tagscope.yaml";

/// Overrides the directory holding the global `config.yaml`
pub const CONFIG_DIR_ENV: &str = "TAGSCOPE_CONFIG_DIR";

/// Valid configuration keys
pub const VALID_KEYS: &[(&str, &str)] = &[
    ("base_url", "Remote service base URL"),
    ("api_key", "API key sent as x-api-key"),
    ("org_id", "Organisation id sent as x-gw-ims-org-id"),
    ("access_token", "Bearer token for the remote service"),
    ("company", "Default company id"),
    ("property", "Default property id"),
    ("page_size", "Page size for ordinary listings"),
    ("rule_page_size", "Page size for rule listings in scans"),
    ("max_pages", "Maximum pages fetched per listing"),
    ("timeout_secs", "Request and analysis timeout in seconds"),
    ("max_retries", "Retries for rate-limited requests"),
    (
        "default_format",
        "Default output format (json, yaml, tsv, csv, md, id)",
    ),
];

/// Keys holding numbers rather than strings
const NUMERIC_KEYS: &[&str] = &[
    "page_size",
    "rule_page_size",
    "max_pages",
    "timeout_secs",
    "max_retries",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("unknown configuration key '{0}' (see `tagscope config keys`)")]
    UnknownKey(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("{0} is not configured (set it with `tagscope config set {0} <value>` or TAGSCOPE_{1})")]
    Missing(&'static str, &'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// tagscope configuration with layered hierarchy
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub org_id: Option<String>,
    pub access_token: Option<String>,

    /// Default company id
    pub company: Option<String>,

    /// Default property id
    pub property: Option<String>,

    pub page_size: Option<u32>,
    pub rule_page_size: Option<u32>,
    pub max_pages: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,

    /// Default output format
    pub default_format: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("company", &self.company)
            .field("property", &self.property)
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let local = std::env::current_dir()
            .ok()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE));
        Self::load_from(
            Self::global_config_path().as_deref(),
            local.as_deref(),
            |name| std::env::var(name).ok(),
        )
    }

    /// Load from explicit file locations and an environment lookup.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load_from<F>(global: Option<&Path>, local: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config, then 3. local config
        for path in [global, local].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::read_file(path) {
                Ok(layer) => config.merge(layer),
                Err(e) => warn!(error = %e, "ignoring config file"),
            }
        }

        // 4. Environment variables
        config.apply_env(env);

        config
    }

    /// Parse one config file
    pub fn read_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, env: F) {
        let set = |slot: &mut Option<String>, name: &str| {
            if let Some(value) = env(name).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        };
        set(&mut self.base_url, "TAGSCOPE_BASE_URL");
        set(&mut self.api_key, "TAGSCOPE_API_KEY");
        set(&mut self.org_id, "TAGSCOPE_ORG_ID");
        set(&mut self.access_token, "TAGSCOPE_ACCESS_TOKEN");
        set(&mut self.company, "TAGSCOPE_COMPANY");
        set(&mut self.property, "TAGSCOPE_PROPERTY");
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join("config.yaml"));
        }
        directories::ProjectDirs::from("", "", "tagscope")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.base_url, other.base_url);
        take(&mut self.api_key, other.api_key);
        take(&mut self.org_id, other.org_id);
        take(&mut self.access_token, other.access_token);
        take(&mut self.company, other.company);
        take(&mut self.property, other.property);
        take(&mut self.page_size, other.page_size);
        take(&mut self.rule_page_size, other.rule_page_size);
        take(&mut self.max_pages, other.max_pages);
        take(&mut self.timeout_secs, other.timeout_secs);
        take(&mut self.max_retries, other.max_retries);
        take(&mut self.default_format, other.default_format);
    }

    /// Value of a key as text, unmasked
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "base_url" => self.base_url.clone(),
            "api_key" => self.api_key.clone(),
            "org_id" => self.org_id.clone(),
            "access_token" => self.access_token.clone(),
            "company" => self.company.clone(),
            "property" => self.property.clone(),
            "page_size" => self.page_size.map(|v| v.to_string()),
            "rule_page_size" => self.rule_page_size.map(|v| v.to_string()),
            "max_pages" => self.max_pages.map(|v| v.to_string()),
            "timeout_secs" => self.timeout_secs.map(|v| v.to_string()),
            "max_retries" => self.max_retries.map(|v| v.to_string()),
            "default_format" => self.default_format.clone(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            rule_page_size: self.rule_page_size.unwrap_or(RULE_SCAN_PAGE_SIZE).max(1),
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1),
        }
    }

    /// HTTP client settings; credentials must be present
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let access_token = self
            .access_token
            .clone()
            .ok_or(ConfigError::Missing("access_token", "ACCESS_TOKEN"))?;
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::Missing("api_key", "API_KEY"))?;

        Ok(ClientConfig {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            org_id: self.org_id.clone().unwrap_or_default(),
            access_token,
            timeout_secs: self.timeout_secs(),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}

/// Reject unknown keys before touching a config file
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(ConfigError::UnknownKey(key.to_string()))
    }
}

/// YAML scalar for `config set`, typed by key
pub fn yaml_value(key: &str, value: &str) -> Result<serde_yml::Value, ConfigError> {
    validate_key(key)?;
    if NUMERIC_KEYS.contains(&key) {
        let number: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got '{value}'"),
        })?;
        return Ok(serde_yml::Value::Number(number.into()));
    }
    Ok(serde_yml::Value::String(value.to_string()))
}
