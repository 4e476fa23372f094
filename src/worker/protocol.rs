// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Supervisor ↔ worker message channel
//!
//! Newline-delimited JSON. The supervisor writes one [`AnalysisRequest`]
//! line to the worker's stdin, the worker writes one [`WorkerReply`] line to
//! its stdout. Nothing else travels on either stream.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorReply, Result};
use crate::result::AnalysisResult;

/// A request to analyze one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub url: String,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Reject requests no worker should be started for
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::InvalidRequest("URL is required".to_string()));
        }

        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
            Ok(_) => Err(Error::InvalidRequest(format!(
                "\"{}\" is not an absolute http(s) URL",
                url
            ))),
            Err(e) => Err(Error::InvalidRequest(format!("\"{}\" is not a valid URL: {}", url, e))),
        }
    }
}

/// The worker's single answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerReply {
    Failure(ErrorReply),
    Success(AnalysisResult),
}

impl WorkerReply {
    pub fn from_result(result: Result<AnalysisResult>) -> Self {
        match result {
            Ok(analysis) => WorkerReply::Success(analysis),
            Err(err) => WorkerReply::Failure(ErrorReply::from(&err)),
        }
    }

    /// Turn a reply back into a result on the supervisor side
    pub fn into_result(self) -> Result<AnalysisResult> {
        match self {
            WorkerReply::Success(analysis) => Ok(analysis),
            WorkerReply::Failure(reply) => Err(Error::Analysis(reply.error)),
        }
    }
}

/// Serialize a message as one line, newline included
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(line)
}

/// Parse one line received from the channel
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RawAuditReport;
    use crate::classifier::build_result;
    use crate::config::ClassificationMode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_empty_url_rejected() {
        let err = AnalysisRequest::new("  ").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(err.to_string(), "Invalid request: URL is required");
    }

    #[test]
    fn test_relative_and_non_http_urls_rejected() {
        assert!(AnalysisRequest::new("example.com/page").validate().is_err());
        assert!(AnalysisRequest::new("ftp://example.com/").validate().is_err());
        assert!(AnalysisRequest::new("mailto:someone@example.com").validate().is_err());
    }

    #[test]
    fn test_absolute_url_accepted() {
        assert!(AnalysisRequest::new("https://www.example.com/about").validate().is_ok());
        assert!(AnalysisRequest::new("http://localhost:3000").validate().is_ok());
    }

    #[test]
    fn test_request_line_format() {
        let line = encode_line(&AnalysisRequest::new("https://example.com")).unwrap();
        assert_eq!(line, b"{\"url\":\"https://example.com\"}\n".to_vec());
    }

    #[test]
    fn test_failure_reply_decodes() {
        let reply: WorkerReply = decode_line("{\"error\":\"boom\"}\n").unwrap();
        assert_eq!(reply, WorkerReply::Failure(ErrorReply::new("boom")));
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_garbage_reply_rejected() {
        assert!(decode_line::<WorkerReply>("{\"status\":\"ok\"}").is_err());
        assert!(decode_line::<WorkerReply>("not json").is_err());
    }

    #[test]
    fn test_issue_reply_with_nested_findings_decodes_unchanged() {
        let report = RawAuditReport::from_value(json!({
            "lighthouseResult": {
                "categories": { "accessibility": { "score": 0.5 } },
                "audits": {
                    "label": {
                        "id": "label",
                        "title": "Form elements do not have associated labels",
                        "score": 0,
                        "tags": ["wcag2a", "wcag412"],
                        "details": { "items": [
                            { "node": { "selector": "input#q", "nodeLabel": "Search" }, "subItems": { "type": "subitems" } },
                            { "node": null, "note": "detached" },
                            { "subItems": { "items": [ { "relatedNode": { "selector": "form" }, "reason": "no label" } ] } }
                        ] }
                    }
                }
            }
        }))
        .unwrap();
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let result = build_result(ClassificationMode::Issues, "https://example.com", &report, timestamp);

        let line = encode_line(&WorkerReply::Success(result.clone())).unwrap();
        let text = String::from_utf8(line).unwrap();
        let reply: WorkerReply = decode_line(&text).unwrap();

        assert_eq!(reply, WorkerReply::Success(result));
        let relayed = serde_json::to_value(reply.into_result().unwrap()).unwrap();
        let written: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(relayed, written);
    }
}
