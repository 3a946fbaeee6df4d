//! Analysis history records

use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::operations::{ComplianceIssue, Risk, SeverityFilter};

/// Number of summary words kept in a history title
const TITLE_WORDS: usize = 5;

/// Time-ordered identifier of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Outcome of one fully successful analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub risks: Vec<Risk>,
    pub compliance_issues: Vec<ComplianceIssue>,
}

impl AnalysisResult {
    pub fn filtered_risks(&self, filter: SeverityFilter) -> Vec<&Risk> {
        filter.apply(&self.risks)
    }
}

/// One committed question and answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
}

/// A completed analysis kept for later recall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistoryEntry {
    pub id: EntryId,
    pub title: String,
    pub document_text: String,
    pub result: AnalysisResult,
    /// Grows while the entry is active; nothing else changes after creation
    pub qa_history: Vec<QaEntry>,
    /// Local time, formatted for display
    pub timestamp: String,
}

impl AnalysisHistoryEntry {
    pub fn new(document_text: String, result: AnalysisResult) -> Self {
        Self {
            id: EntryId::new(),
            title: derive_title(&result.summary),
            document_text,
            result,
            qa_history: Vec::new(),
            timestamp: Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        }
    }
}

/// First five words of the summary followed by an ellipsis
pub fn derive_title(summary: &str) -> String {
    let words: Vec<&str> = summary.split_whitespace().take(TITLE_WORDS).collect();
    format!("{}...", words.join(" "))
}
