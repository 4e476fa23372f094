// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Finished analysis results, in the JSON shapes handed to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, ComplianceScores, NormalizedFinding, WcagLevel};

/// Terminal artifact of one analysis. Exactly one shape per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Issues(IssueReport),
    Scores(ScoreReport),
}

impl AnalysisResult {
    pub fn url(&self) -> &str {
        match self {
            AnalysisResult::Issues(report) => &report.url,
            AnalysisResult::Scores(report) => &report.url,
        }
    }
}

/// Failing audits per WCAG level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "levelA")]
    pub level_a: LevelBucket,
    #[serde(rename = "levelAA")]
    pub level_aa: LevelBucket,
}

impl IssueReport {
    pub fn new(url: impl Into<String>, classification: Classification, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            timestamp,
            level_a: classification.level_a,
            level_aa: classification.level_aa,
        }
    }
}

/// Issues of one level; `totalIssues` is always `issues.len()`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelBucket {
    #[serde(rename = "totalIssues")]
    total_issues: usize,
    issues: Vec<ClassifiedIssue>,
}

impl LevelBucket {
    pub fn new(issues: Vec<ClassifiedIssue>) -> Self {
        Self {
            total_issues: issues.len(),
            issues,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.total_issues
    }

    pub fn issues(&self) -> &[ClassifiedIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A failing audit with its normalized findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIssue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    #[serde(rename = "displayValue", default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    pub details: IssueDetails,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IssueDetails {
    #[serde(default)]
    pub items: Vec<NormalizedFinding>,
}

/// Compliance ratios per level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub url: String,
    /// Lighthouse accessibility category score, copied verbatim
    #[serde(rename = "overallScore")]
    pub overall_score: Option<f64>,
    #[serde(rename = "levelAScore")]
    pub level_a_score: f64,
    #[serde(rename = "levelAAScore")]
    pub level_aa_score: f64,
    pub issues: Vec<ScoredIssue>,
}

impl ScoreReport {
    pub fn new(url: impl Into<String>, scores: ComplianceScores) -> Self {
        Self {
            url: url.into(),
            overall_score: scores.overall_score,
            level_a_score: scores.level_a.compliance(),
            level_aa_score: scores.level_aa.compliance(),
            issues: scores.issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIssue {
    pub name: String,
    pub description: String,
    pub level: WcagLevel,
}
