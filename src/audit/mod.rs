// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Lighthouse accessibility audit reports as returned by PageSpeed Insights
//!
//! The service response is decoded exactly once, here. Everything the
//! classifier later relies on (the accessibility category, the audit map,
//! each audit's shape) is checked during that decode, so a report that
//! reaches the classifier is complete or it does not exist.

pub mod client;

pub use client::{AuditCategory, AuditOptions, AuditSource, PageSpeedClient, Strategy};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Category key of the accessibility score inside `lighthouseResult.categories`
pub const ACCESSIBILITY_CATEGORY: &str = "accessibility";

/// A validated accessibility audit report
#[derive(Debug, Clone, PartialEq)]
pub struct RawAuditReport {
    /// Overall accessibility score (0..=1), null when Lighthouse could not score
    pub accessibility_score: Option<f64>,
    /// Audits in the order the service listed them
    pub audits: Vec<(String, RawAudit)>,
}

/// One accessibility check performed by Lighthouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAudit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// 0 is a failure, 1 a pass, null "not applicable" or manual
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub details: Option<RawDetails>,
}

/// Lighthouse emits explicit nulls for fields it could not fill; treat them as absent
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawAudit {
    /// Failed outright (score exactly 0)
    pub fn is_failure(&self) -> bool {
        self.score == Some(0.0)
    }

    /// Passed outright (score exactly 1)
    pub fn is_pass(&self) -> bool {
        self.score == Some(1.0)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Carries any `wcag*` tag
    pub fn has_wcag_tag(&self) -> bool {
        self.tags.iter().any(|t| t.starts_with("wcag"))
    }

    /// Findings listed under `details.items`, if any
    pub fn findings(&self) -> &[Value] {
        self.details
            .as_ref()
            .and_then(|d| d.items.as_deref())
            .unwrap_or(&[])
    }
}

/// `details` block of an audit; only `items` is interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetails {
    #[serde(default)]
    pub items: Option<Vec<Value>>,
}

/// PageSpeed Insights v5 response envelope, as far as it is needed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Deserialize)]
struct LighthouseResult {
    categories: Option<Map<String, Value>>,
    audits: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct CategoryScore {
    #[serde(default)]
    score: Option<f64>,
}

impl RawAuditReport {
    /// Decode a PageSpeed response body into a complete report
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::MalformedUpstreamResponse(format!("response is not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Validate an already parsed PageSpeed response
    pub fn from_value(value: Value) -> Result<Self> {
        let response: PageSpeedResponse = serde_json::from_value(value)
            .map_err(|e| Error::MalformedUpstreamResponse(e.to_string()))?;

        let lighthouse = response
            .lighthouse_result
            .ok_or_else(|| malformed("missing lighthouseResult"))?;

        let category = lighthouse
            .categories
            .and_then(|mut categories| categories.remove(ACCESSIBILITY_CATEGORY))
            .ok_or_else(|| malformed("missing lighthouseResult.categories.accessibility"))?;
        let category: CategoryScore = serde_json::from_value(category).map_err(|e| {
            malformed(&format!("accessibility category is not an object: {}", e))
        })?;

        let audit_map = lighthouse
            .audits
            .ok_or_else(|| malformed("missing lighthouseResult.audits"))?;

        let mut audits = Vec::with_capacity(audit_map.len());
        for (key, raw) in audit_map {
            let audit: RawAudit = serde_json::from_value(raw)
                .map_err(|e| malformed(&format!("audit \"{}\" could not be decoded: {}", key, e)))?;
            audits.push((key, audit));
        }

        Ok(Self {
            accessibility_score: category.score,
            audits,
        })
    }

    pub fn audit(&self, id: &str) -> Option<&RawAudit> {
        self.audits.iter().find(|(key, _)| key == id).map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.audits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audits.is_empty()
    }
}

fn malformed(message: &str) -> Error {
    Error::MalformedUpstreamResponse(message.to_string())
}
