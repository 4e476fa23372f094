// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for wcagbot

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wcagbot
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Audit service request failed: {0}")]
    UpstreamTransport(String),

    #[error("Audit service returned a malformed report: {0}")]
    MalformedUpstreamResponse(String),

    #[error("Worker transport fault: {0}")]
    WorkerTransport(String),

    #[error("Worker {} before replying", describe_exit(.code))]
    WorkerCrashed { code: Option<i32> },

    /// Error reported by the worker itself, relayed as-is
    #[error("{0}")]
    Analysis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

// The request URL carries the API key, so it is stripped before formatting.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::UpstreamTransport(err.without_url().to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Failure payload handed back to callers: `{ "error": "<message>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<&Error> for ErrorReply {
    fn from(err: &Error) -> Self {
        Self::new(err.to_string())
    }
}
