// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! wcagbot - WCAG level classification of PageSpeed accessibility audits
//!
//! Given a page URL, wcagbot asks PageSpeed Insights for a Lighthouse
//! accessibility audit and reshapes the raw report into findings per WCAG
//! conformance level (A, AA), or into per-level compliance scores.
//!
//! # Architecture
//!
//! ```text
//! caller → AnalysisService → worker (child process) → PageSpeed → classifier → reply
//! ```
//!
//! Each request runs in its own worker so a hung or crashing audit only
//! affects that request.

pub mod api;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod report;
pub mod result;
pub mod supervisor;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::audit::{AuditSource, PageSpeedClient, RawAuditReport};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorReply, Result};
    pub use crate::result::AnalysisResult;
    pub use crate::supervisor::{AnalysisService, TaskAnalyzer, WorkerSupervisor};
    pub use crate::worker::AnalysisRequest;
}
