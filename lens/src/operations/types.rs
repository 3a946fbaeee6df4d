//! Typed input and output records for the analysis operations
//!
//! Field names on the wire are camelCase (`documentText`, `complianceIssues`,
//! `summaryA`) to match the prompt templates and the declared output shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Risk level assigned by the risk detector
///
/// Three named bins, no numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter applied when presenting risks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    /// Identity filter
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    /// Check whether a single risk passes the filter
    pub fn matches(&self, risk: &Risk) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(severity) => risk.severity == *severity,
        }
    }

    /// Apply the filter, preserving the original order
    pub fn apply<'a>(&self, risks: &'a [Risk]) -> Vec<&'a Risk> {
        risks.iter().filter(|r| self.matches(r)).collect()
    }
}

impl FromStr for SeverityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SeverityFilter::All),
            "high" => Ok(SeverityFilter::Only(Severity::High)),
            "medium" => Ok(SeverityFilter::Only(Severity::Medium)),
            "low" => Ok(SeverityFilter::Only(Severity::Low)),
            other => Err(format!("unknown severity filter '{}' (expected all, high, medium or low)", other)),
        }
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityFilter::All => f.write_str("All"),
            SeverityFilter::Only(severity) => write!(f, "{}", severity),
        }
    }
}

/// A clause flagged as risky for the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Excerpt of the document containing the risk
    pub clause: String,
    /// Explanation of the risk and its impact
    pub risk: String,
    pub severity: Severity,
}

/// A clause that may violate a law or regulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub law: String,
    pub clause: String,
    pub issue: String,
    pub recommendation: String,
}

/// One topic on which two documents differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub topic: String,
    pub summary_a: String,
    pub summary_b: String,
    pub verdict: String,
}

// === Operation inputs ===

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInput {
    pub document_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainClauseInput {
    pub document_text: String,
    pub clause: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerQuestionInput {
    pub document_text: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRisksInput {
    pub document_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckComplianceInput {
    pub document_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareDocumentsInput {
    pub document_text_a: String,
    pub document_text_b: String,
}

// === Operation outputs ===

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummarizeOutput {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExplainClauseOutput {
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnswerQuestionOutput {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetectRisksOutput {
    pub risks: Vec<Risk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckComplianceOutput {
    pub compliance_issues: Vec<ComplianceIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompareDocumentsOutput {
    pub comparison: Vec<ComparisonPoint>,
}
