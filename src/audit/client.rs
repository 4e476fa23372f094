// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Client for the PageSpeed Insights v5 `runPagespeed` endpoint
//!
//! One call per audit, no retries. The API key travels only as the `key`
//! query parameter and is never logged or echoed into error messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::RawAuditReport;
use crate::config::PageSpeedConfig;
use crate::error::{Error, Result};

/// Device the page is audited as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

/// Lighthouse category requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditCategory {
    #[default]
    Accessibility,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Accessibility => "accessibility",
        }
    }
}

/// Per-call audit parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditOptions {
    pub strategy: Strategy,
    pub category: AuditCategory,
}

/// Anything that can produce an accessibility report for a URL
#[async_trait]
pub trait AuditSource: Send + Sync {
    /// Run a single audit; fails rather than returning a partial report
    async fn run_audit(&self, url: &str, options: &AuditOptions) -> Result<RawAuditReport>;
}

/// PageSpeed Insights HTTP client
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PageSpeedClient {
    /// Create a client from configuration; the key must already be resolved
    pub fn new(config: &PageSpeedConfig, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("wcagbot/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl AuditSource for PageSpeedClient {
    async fn run_audit(&self, url: &str, options: &AuditOptions) -> Result<RawAuditReport> {
        info!(
            "Requesting {} audit of {} ({})",
            options.category.as_str(),
            url,
            options.strategy.as_str()
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", options.strategy.as_str()),
                ("category", options.category.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::UpstreamTransport(format!(
                "PageSpeed returned status {}: {}",
                status,
                service_error_message(&body)
            )));
        }

        debug!("PageSpeed response received ({} bytes)", body.len());

        let report = RawAuditReport::from_json(&body)?;
        debug!("Report contains {} audits", report.len());
        Ok(report)
    }
}

/// Google API error envelope: `{ "error": { "code": 429, "message": "..." } }`
#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: ServiceError,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
}

fn service_error_message(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => "no error message".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_mobile_accessibility() {
        let options = AuditOptions::default();
        assert_eq!(options.strategy.as_str(), "mobile");
        assert_eq!(options.category.as_str(), "accessibility");
        assert_eq!(Strategy::Desktop.as_str(), "desktop");
    }

    #[test]
    fn test_service_error_message_extraction() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(service_error_message(body), "Quota exceeded");
        assert_eq!(service_error_message("Bad Gateway"), "no error message");
    }
}
