// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management for wcagbot
//!
//! Layering, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. TOML file (optional)
//! 3. `WCAGBOT__SECTION__KEY` environment variables
//! 4. `PAGESPEED_API_KEY`, only when no key was configured above
//!
//! The PageSpeed key is never logged.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable consulted for the PageSpeed credential
pub const API_KEY_ENV: &str = "PAGESPEED_API_KEY";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// HTTP front configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// PageSpeed Insights connection
    #[serde(default)]
    pub pagespeed: PageSpeedConfig,

    /// Classification and isolation settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Clone, Deserialize)]
pub struct PageSpeedConfig {
    /// runPagespeed endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key; required at startup
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional client-side timeout for the audit call (seconds).
    /// Unset means the call waits on the service.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

// Hand-written so the key cannot leak through `{:?}`.
impl std::fmt::Debug for PageSpeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSpeedConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_endpoint() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
}

/// Which result shape a worker produces
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Failing audits with full finding detail, bucketed per WCAG level
    #[default]
    Issues,
    /// Per-level pass ratios plus a flat issue list
    Scores,
}

/// Where the pipeline runs for each request
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// One child process per request (`wcagbot worker`)
    #[default]
    Process,
    /// One tokio task per request inside the current process
    Task,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub mode: ClassificationMode,

    #[serde(default)]
    pub isolation: IsolationMode,
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults and environment", path.display());
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("WCAGBOT").separator("__"));

        let config = builder.build()?;
        let mut parsed: Config = config.try_deserialize()?;

        if parsed.pagespeed.api_key.is_none() {
            parsed.pagespeed.api_key = std::env::var(API_KEY_ENV).ok();
        }

        Ok(parsed)
    }

    /// Reject configurations the process cannot start with
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        if self.pagespeed.endpoint.trim().is_empty() {
            return Err(Error::Config("pagespeed.endpoint must not be empty".to_string()));
        }

        Ok(())
    }

    /// The PageSpeed credential, or a configuration error if it is absent
    pub fn api_key(&self) -> Result<&str> {
        match self.pagespeed.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "{} is not set (or set pagespeed.api_key in the config file)",
                API_KEY_ENV
            ))),
        }
    }
}
