//! Terminal rendering of session contents

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use crate::operations::{ComparisonPoint, ComplianceIssue, Risk, Severity, SeverityFilter};
use crate::orchestrator::Notification;
use crate::session::{AnalysisHistoryEntry, AnalysisResult, EntryId, QaEntry};

fn heading(text: &str) -> ColoredString {
    text.bright_cyan().bold()
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => severity.as_str().red().bold(),
        Severity::Medium => severity.as_str().yellow().bold(),
        Severity::Low => severity.as_str().green(),
    }
}

pub fn notification(n: &Notification) -> String {
    format!("{} {}", format!("{}:", n.title).red().bold(), n.message)
}

pub fn summary(result: &AnalysisResult) -> String {
    format!("{}\n{}\n", heading("Summary"), result.summary)
}

pub fn risks(result: &AnalysisResult, filter: SeverityFilter) -> String {
    let shown: Vec<&Risk> = result.filtered_risks(filter);
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}, showing {})", heading("Risks"), result.risks.len(), filter);

    if shown.is_empty() {
        let _ = writeln!(out, "{}", "No risks found.".dimmed());
        return out;
    }
    for (i, risk) in shown.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. [{}] \"{}\"", i + 1, severity_label(risk.severity), risk.clause);
        let _ = writeln!(out, "     {}", risk.risk);
    }
    out
}

pub fn compliance(issues: &[ComplianceIssue]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", heading("Compliance"), issues.len());

    if issues.is_empty() {
        let _ = writeln!(out, "{}", "No compliance issues found.".dimmed());
        return out;
    }
    for (i, issue) in issues.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} \"{}\"", i + 1, issue.law.bold(), issue.clause);
        let _ = writeln!(out, "     Issue: {}", issue.issue);
        if !issue.recommendation.trim().is_empty() {
            let _ = writeln!(out, "     Recommendation: {}", issue.recommendation);
        }
    }
    out
}

pub fn analysis(result: &AnalysisResult, filter: SeverityFilter) -> String {
    format!("{}\n{}\n{}", summary(result), risks(result, filter), compliance(&result.compliance_issues))
}

pub fn comparison(points: &[ComparisonPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", heading("Comparison"), points.len());

    if points.is_empty() {
        let _ = writeln!(out, "{}", "No material differences found.".dimmed());
        return out;
    }
    for point in points {
        let _ = writeln!(out, "{}", point.topic.bold());
        let _ = writeln!(out, "  A: {}", point.summary_a);
        let _ = writeln!(out, "  B: {}", point.summary_b);
        let _ = writeln!(out, "  {} {}", "Verdict:".green(), point.verdict);
    }
    out
}

pub fn transcript(qa: &[QaEntry]) -> String {
    let mut out = String::new();
    for entry in qa {
        let _ = writeln!(out, "{} {}", "Q:".bright_green(), entry.question);
        let _ = writeln!(out, "{} {}", "A:".bright_blue(), entry.answer);
    }
    out
}

/// Numbered list, most recent first, with the active entry marked
pub fn history(entries: &[AnalysisHistoryEntry], active: Option<EntryId>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading("History"));

    if entries.is_empty() {
        let _ = writeln!(out, "{}", "No analyses yet.".dimmed());
        return out;
    }
    for (i, entry) in entries.iter().enumerate() {
        let marker = if Some(entry.id) == active { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {:>3}. {}  {}  {}",
            marker.bright_green(),
            i + 1,
            entry.title,
            entry.timestamp.dimmed(),
            format!("({} Q&A)", entry.qa_history.len()).dimmed()
        );
    }
    out
}
