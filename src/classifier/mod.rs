// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! WCAG level classification of Lighthouse accessibility audits
//!
//! Two shapes can be produced from the same report:
//!
//! - **issues**: failing audits (score 0) with full finding detail,
//!   bucketed into Level A and Level AA by exact tag match
//! - **scores**: per-level compliance ratios over every WCAG-tagged audit,
//!   plus a flat list of the audits that did not pass
//!
//! Classification is pure. The timestamp of an issue report is supplied by
//! the caller, so classifying the same report twice gives equal results.

pub mod normalize;

pub use normalize::{normalize_finding, NodeSummary, NormalizedFinding, RelatedNodeSummary};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{RawAudit, RawAuditReport};
use crate::config::ClassificationMode;
use crate::result::{
    AnalysisResult, ClassifiedIssue, IssueDetails, IssueReport, LevelBucket, ScoreReport,
    ScoredIssue,
};

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
}

impl WcagLevel {
    pub const ALL: [WcagLevel; 2] = [WcagLevel::A, WcagLevel::AA];

    /// Lighthouse/axe tag marking an audit as belonging to this level
    pub fn tag(&self) -> &'static str {
        match self {
            WcagLevel::A => "wcag2a",
            WcagLevel::AA => "wcag2aa",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.tag() == tag)
    }

    /// Levels an audit belongs to, in A, AA order
    pub fn levels_of(audit: &RawAudit) -> Vec<WcagLevel> {
        Self::ALL
            .into_iter()
            .filter(|level| audit.has_tag(level.tag()))
            .collect()
    }
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
        }
    }
}

/// Failing audits bucketed per level
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub level_a: LevelBucket,
    pub level_aa: LevelBucket,
}

/// Bucket failing, WCAG-tagged audits by level
pub fn classify(report: &RawAuditReport) -> Classification {
    let mut level_a = Vec::new();
    let mut level_aa = Vec::new();

    for (key, audit) in &report.audits {
        if !audit.is_failure() || audit.tags.is_empty() {
            continue;
        }

        let levels = WcagLevel::levels_of(audit);
        if levels.is_empty() {
            continue;
        }

        let issue = classified_issue(key, audit);
        for level in levels {
            match level {
                WcagLevel::A => level_a.push(issue.clone()),
                WcagLevel::AA => level_aa.push(issue.clone()),
            }
        }
    }

    tracing::debug!(
        "Classified {} Level A and {} Level AA issues",
        level_a.len(),
        level_aa.len()
    );

    Classification {
        level_a: LevelBucket::new(level_a),
        level_aa: LevelBucket::new(level_aa),
    }
}

fn classified_issue(key: &str, audit: &RawAudit) -> ClassifiedIssue {
    let id = if audit.id.is_empty() { key } else { audit.id.as_str() };

    ClassifiedIssue {
        id: id.to_string(),
        title: audit.title.clone(),
        description: audit.description.clone(),
        score: audit.score.unwrap_or_default(),
        display_value: audit.display_value.clone(),
        details: IssueDetails {
            items: audit.findings().iter().map(normalize_finding).collect(),
        },
    }
}

/// Pass/fail tally for one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelTally {
    pub total: usize,
    pub failed: usize,
}

impl LevelTally {
    /// `1 - failed/total`, or full compliance when nothing was tagged
    pub fn compliance(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            1.0 - self.failed as f64 / self.total as f64
        }
    }
}

/// Result of the scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceScores {
    pub overall_score: Option<f64>,
    pub level_a: LevelTally,
    pub level_aa: LevelTally,
    pub issues: Vec<ScoredIssue>,
}

/// Compute per-level compliance over every WCAG-tagged audit in one pass.
///
/// Anything other than an exact pass (score 1) counts as failed, including
/// not-applicable audits with a null score.
pub fn score(report: &RawAuditReport) -> ComplianceScores {
    let mut level_a = LevelTally::default();
    let mut level_aa = LevelTally::default();
    let mut issues = Vec::new();

    for (_, audit) in &report.audits {
        if !audit.has_wcag_tag() {
            continue;
        }

        for level in WcagLevel::levels_of(audit) {
            let tally = match level {
                WcagLevel::A => &mut level_a,
                WcagLevel::AA => &mut level_aa,
            };
            tally.total += 1;

            if !audit.is_pass() {
                tally.failed += 1;
                issues.push(ScoredIssue {
                    name: audit.title.clone(),
                    description: audit.description.clone(),
                    level,
                });
            }
        }
    }

    ComplianceScores {
        overall_score: report.accessibility_score,
        level_a,
        level_aa,
        issues,
    }
}

/// Produce the configured result shape for an analyzed URL
pub fn build_result(
    mode: ClassificationMode,
    url: &str,
    report: &RawAuditReport,
    timestamp: DateTime<Utc>,
) -> AnalysisResult {
    match mode {
        ClassificationMode::Issues => {
            AnalysisResult::Issues(IssueReport::new(url, classify(report), timestamp))
        }
        ClassificationMode::Scores => AnalysisResult::Scores(ScoreReport::new(url, score(report))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn report(audits: Value) -> RawAuditReport {
        RawAuditReport::from_value(json!({
            "lighthouseResult": {
                "categories": { "accessibility": { "score": 0.72 } },
                "audits": audits
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_null_tagged_audit_is_skipped_not_fatal() {
        let report = report(json!({
            "color-contrast": { "id": "color-contrast", "score": 0, "tags": ["wcag2aa"] },
            "meta": { "title": null, "score": null, "tags": null }
        }));

        let classification = classify(&report);
        assert_eq!(classification.level_a.total_issues(), 0);
        assert_eq!(classification.level_aa.total_issues(), 1);

        let scores = score(&report);
        assert_eq!(scores.level_aa, LevelTally { total: 1, failed: 1 });
    }

    #[test]
    fn test_contrast_failure_lands_in_aa_only() {
        let report = report(json!({
            "color-contrast": { "id": "color-contrast", "score": 0, "tags": ["wcag2aa"] }
        }));

        let classification = classify(&report);
        assert_eq!(classification.level_a.total_issues(), 0);
        assert_eq!(classification.level_aa.total_issues(), 1);
        assert_eq!(classification.level_aa.issues()[0].id, "color-contrast");
    }

    #[test]
    fn test_audit_with_both_tags_lands_in_both() {
        let report = report(json!({
            "label": { "id": "label", "title": "Form elements have labels", "score": 0, "tags": ["wcag2a", "wcag2aa", "wcag412"] }
        }));

        let classification = classify(&report);
        assert_eq!(classification.level_a.total_issues(), 1);
        assert_eq!(classification.level_aa.total_issues(), 1);
        assert_eq!(classification.level_a.issues()[0], classification.level_aa.issues()[0]);
    }

    #[test]
    fn test_non_failures_and_untagged_excluded() {
        let report = report(json!({
            "passed": { "id": "passed", "score": 1, "tags": ["wcag2a"] },
            "manual": { "id": "manual", "score": null, "tags": ["wcag2a"] },
            "partial": { "id": "partial", "score": 0.5, "tags": ["wcag2aa"] },
            "untagged": { "id": "untagged", "score": 0 },
            "empty-tags": { "id": "empty-tags", "score": 0, "tags": [] },
            "other-tags": { "id": "other-tags", "score": 0, "tags": ["best-practice", "wcag21aa"] }
        }));

        let classification = classify(&report);
        assert_eq!(classification.level_a.total_issues(), 0);
        assert_eq!(classification.level_aa.total_issues(), 0);
    }

    #[test]
    fn test_bucket_membership_matches_tags() {
        let report = report(json!({
            "a-only": { "id": "a-only", "score": 0, "tags": ["wcag2a"] },
            "aa-only": { "id": "aa-only", "score": 0, "tags": ["wcag2aa"] },
            "both": { "id": "both", "score": 0, "tags": ["wcag2aa", "wcag2a"] }
        }));

        let classification = classify(&report);
        let a_ids: Vec<&str> = classification.level_a.issues().iter().map(|i| i.id.as_str()).collect();
        let aa_ids: Vec<&str> = classification.level_aa.issues().iter().map(|i| i.id.as_str()).collect();

        assert_eq!(a_ids, vec!["a-only", "both"]);
        assert_eq!(aa_ids, vec!["aa-only", "both"]);
        assert_eq!(classification.level_a.total_issues(), classification.level_a.issues().len());
        assert_eq!(classification.level_aa.total_issues(), classification.level_aa.issues().len());
    }

    #[test]
    fn test_issue_carries_normalized_details() {
        let report = report(json!({
            "image-alt": {
                "id": "image-alt",
                "title": "Image elements have [alt] attributes",
                "description": "Informative elements should aim for short, descriptive alternate text.",
                "score": 0,
                "displayValue": "2 elements",
                "tags": ["wcag2a"],
                "details": {
                    "type": "table",
                    "items": [
                        { "node": { "selector": "img.hero", "snippet": "<img class=\"hero\">", "nodeLabel": "hero" } },
                        { "node": { "selector": "img.logo" } }
                    ]
                }
            }
        }));

        let classification = classify(&report);
        let issue = &classification.level_a.issues()[0];
        assert_eq!(issue.score, 0.0);
        assert_eq!(issue.display_value.as_deref(), Some("2 elements"));
        assert_eq!(issue.details.items.len(), 2);

        let second = issue.details.items[1].node.as_ref().unwrap();
        assert_eq!(second.selector, "img.logo");
        assert_eq!(second.snippet, "");
        assert_eq!(second.explanation, "");
    }

    #[test]
    fn test_missing_details_yield_empty_items() {
        let report = report(json!({ "bypass": { "id": "bypass", "score": 0, "tags": ["wcag2a"] } }));
        let classification = classify(&report);
        assert!(classification.level_a.issues()[0].details.items.is_empty());
    }

    #[test]
    fn test_issue_id_falls_back_to_audit_key() {
        let report = report(json!({ "document-title": { "score": 0, "tags": ["wcag2a"] } }));
        let classification = classify(&report);
        assert_eq!(classification.level_a.issues()[0].id, "document-title");
    }

    #[test]
    fn test_classification_is_idempotent() {
        let report = report(json!({
            "label": { "id": "label", "score": 0, "tags": ["wcag2a"], "details": { "items": [ { "node": { "selector": "input" } } ] } },
            "color-contrast": { "id": "color-contrast", "score": 0, "tags": ["wcag2aa"] }
        }));

        let timestamp = Utc::now();
        let first = build_result(ClassificationMode::Issues, "https://example.com", &report, timestamp);
        let second = build_result(ClassificationMode::Issues, "https://example.com", &report, timestamp);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(classify(&report), classify(&report));
    }

    #[test]
    fn test_scores_default_to_full_compliance_without_tags() {
        let report = report(json!({
            "viewport": { "id": "viewport", "score": 0 },
            "best": { "id": "best", "score": 0, "tags": ["best-practice"] }
        }));

        let scores = score(&report);
        assert_eq!(scores.level_a.compliance(), 1.0);
        assert_eq!(scores.level_aa.compliance(), 1.0);
        assert!(scores.issues.is_empty());
        assert_eq!(scores.overall_score, Some(0.72));
    }

    #[test]
    fn test_scores_count_every_tagged_audit() {
        let report = report(json!({
            "a1": { "title": "A one", "score": 1, "tags": ["wcag2a"] },
            "a2": { "title": "A two", "score": 0, "tags": ["wcag2a"] },
            "a3": { "title": "A three", "score": 1, "tags": ["wcag2a"] },
            "a4": { "title": "A four", "score": null, "tags": ["wcag2a"] },
            "aa1": { "title": "AA one", "score": 0, "tags": ["wcag2aa"] },
            "aa2": { "title": "AA two", "score": 1, "tags": ["wcag2aa"] }
        }));

        let scores = score(&report);
        assert_eq!(scores.level_a, LevelTally { total: 4, failed: 2 });
        assert_eq!(scores.level_aa, LevelTally { total: 2, failed: 1 });
        assert!((scores.level_a.compliance() - 0.5).abs() < f64::EPSILON);
        assert!((scores.level_aa.compliance() - 0.5).abs() < f64::EPSILON);

        let names: Vec<(&str, WcagLevel)> = scores.issues.iter().map(|i| (i.name.as_str(), i.level)).collect();
        assert_eq!(
            names,
            vec![("A two", WcagLevel::A), ("A four", WcagLevel::A), ("AA one", WcagLevel::AA)]
        );
    }

    #[test]
    fn test_scoring_result_shape() {
        let report = report(json!({}));
        let result = build_result(ClassificationMode::Scores, "https://example.com", &report, Utc::now());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "url": "https://example.com",
                "overallScore": 0.72,
                "levelAScore": 1.0,
                "levelAAScore": 1.0,
                "issues": []
            })
        );
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(WcagLevel::from_tag("wcag2a"), Some(WcagLevel::A));
        assert_eq!(WcagLevel::from_tag("wcag2aa"), Some(WcagLevel::AA));
        assert_eq!(WcagLevel::from_tag("wcag2aaa"), None);
        assert_eq!(WcagLevel::AA.to_string(), "AA");
    }
}
