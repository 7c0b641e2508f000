//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/alto-geonames/config.toml` (XDG) or platform config dir
//! 3. Project config: `.alto-geonames.toml`
//! 4. An explicit file passed with `--config`
//! 5. Environment variables: `ALTO_GEONAMES_*`, with `__` separating sections
//!    (e.g. `ALTO_GEONAMES_GEONAMES__ACCOUNT=myuser`)
//!
//! # Example
//!
//! ```toml
//! [geonames]
//! account = "myuser"
//! api_url = "http://api.geonames.org"
//! timeout_secs = 30
//!
//! [step]
//! allow_task_finish_buttons = false
//! ```

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default GeoNames account, the public demo user.
pub const DEFAULT_ACCOUNT: &str = "testuser";

/// Default GeoNames web service base URL.
pub const DEFAULT_API_URL: &str = "http://api.geonames.org";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub geonames: GeonamesConfig,
    #[serde(default)]
    pub step: StepConfig,
}

/// GeoNames search service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeonamesConfig {
    /// Account name sent as the `username` query parameter.
    pub account: String,
    /// Base URL of the web service, without the `/searchJSON` path.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeonamesConfig {
    fn default() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GeonamesConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/searchJSON", self.api_url.trim_end_matches('/'))
    }
}

/// Workflow-step settings owned by the hosting engine.
///
/// Carried for completeness; the enrichment itself never reads them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Whether the engine shows finish buttons for this task.
    pub allow_task_finish_buttons: bool,
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load config, layering an explicit file above the project config.
    pub fn load_with(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::extract_with(extra)?;
        config.validate()?;
        Ok(config)
    }

    /// Extract layered config without validating it, for callers that still
    /// apply overrides on top.
    pub fn extract_with(extra: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(extra).extract()?)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            // User config (lowest file priority)
            .merge(Toml::file(Self::user_config_path()))
            // Project config
            .merge(Toml::file(".alto-geonames.toml"));

        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }

        // Environment variables (highest priority)
        figment.merge(Env::prefixed("ALTO_GEONAMES_").split("__"))
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geonames.account.trim().is_empty() {
            return Err(figment::Error::from("geonames.account must not be empty".to_string()).into());
        }
        if let Err(e) = reqwest::Url::parse(&self.geonames.api_url) {
            return Err(figment::Error::from(format!(
                "geonames.api_url '{}' is not a valid URL: {}",
                self.geonames.api_url, e
            ))
            .into());
        }
        if self.geonames.timeout_secs == 0 {
            return Err(
                figment::Error::from("geonames.timeout_secs must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// User config path: ~/.config/alto-geonames/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home
                .join(".config")
                .join("alto-geonames")
                .join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("alto-geonames").join("config.toml"))
            .unwrap_or_default()
    }
}
