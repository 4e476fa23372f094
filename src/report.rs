// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Report rendering for analysis results.
//!
//! Supports two output formats:
//! - Text: human-readable summary per WCAG level
//! - JSON: the result exactly as the HTTP front returns it

use crate::result::{AnalysisResult, IssueReport, LevelBucket, ScoreReport};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

/// Render a result in the requested format
pub fn generate_report(result: &AnalysisResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(result),
        OutputFormat::Json => generate_json_report(result),
    }
}

fn generate_json_report(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
    })
}

fn generate_text_report(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("=== wcagbot Accessibility Report ===\n\n");
    output.push_str(&format!("URL: {}\n", result.url()));

    match result {
        AnalysisResult::Issues(report) => push_issue_report(&mut output, report),
        AnalysisResult::Scores(report) => push_score_report(&mut output, report),
    }

    output
}

fn push_issue_report(output: &mut String, report: &IssueReport) {
    output.push_str(&format!("Analyzed: {}\n\n", report.timestamp.to_rfc3339()));

    if report.level_a.is_empty() && report.level_aa.is_empty() {
        output.push_str("No failing WCAG A/AA audits found.\n");
        return;
    }

    push_level(output, "A", &report.level_a);
    push_level(output, "AA", &report.level_aa);
}

fn push_level(output: &mut String, level: &str, bucket: &LevelBucket) {
    output.push_str(&format!("--- Level {} ({}) ---\n", level, bucket.total_issues()));

    for issue in bucket.issues() {
        match issue.display_value {
            Some(ref value) => output.push_str(&format!("[{}] {} ({})\n", issue.id, issue.title, value)),
            None => output.push_str(&format!("[{}] {}\n", issue.id, issue.title)),
        }

        for finding in &issue.details.items {
            if let Some(ref node) = finding.node {
                if node.node_label.is_empty() {
                    output.push_str(&format!("  at {}\n", node.selector));
                } else {
                    output.push_str(&format!("  at {} ({})\n", node.selector, node.node_label));
                }
            }
        }
    }

    output.push('\n');
}

fn push_score_report(output: &mut String, report: &ScoreReport) {
    match report.overall_score {
        Some(score) => output.push_str(&format!("Overall: {:.0}%\n", score * 100.0)),
        None => output.push_str("Overall: n/a\n"),
    }
    output.push_str(&format!("Level A: {:.0}%\n", report.level_a_score * 100.0));
    output.push_str(&format!("Level AA: {:.0}%\n\n", report.level_aa_score * 100.0));

    if report.issues.is_empty() {
        output.push_str("No failing WCAG A/AA audits found.\n");
        return;
    }

    output.push_str(&format!("--- Issues ({}) ---\n", report.issues.len()));
    for issue in &report.issues {
        output.push_str(&format!("[{}] {}\n", issue.level, issue.name));
    }
}
