//! Session state and the reducer that owns every mutation
//!
//! `reduce` never mutates its input: it returns the next snapshot or an
//! error, and checks the session invariant before handing the snapshot back.

use std::collections::HashSet;

use tracing::debug;

use super::history::{AnalysisHistoryEntry, AnalysisResult, EntryId, QaEntry};
use super::messages::SessionError;
use crate::operations::ComparisonPoint;

/// Where an uploaded document goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSlot {
    /// The document under analysis
    Primary,
    ComparisonA,
    ComparisonB,
}

/// Clause explanation surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExplanationDialog {
    #[default]
    Closed,
    Loading {
        clause: String,
    },
    Shown {
        clause: String,
        explanation: String,
    },
}

impl ExplanationDialog {
    /// Waiting on an explanation of exactly this clause
    pub fn is_loading(&self, clause: &str) -> bool {
        matches!(self, Self::Loading { clause: pending } if pending == clause)
    }
}

/// The comparison lane, independent of analysis and history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonState {
    pub document_a: Option<String>,
    pub document_b: Option<String>,
    pub result: Option<Vec<ComparisonPoint>>,
    /// Bumped on every upload to either slot
    pub version: u64,
    pub in_flight: bool,
}

impl ComparisonState {
    fn slot_mut(&mut self, slot: DocumentSlot) -> Option<&mut Option<String>> {
        match slot {
            DocumentSlot::ComparisonA => Some(&mut self.document_a),
            DocumentSlot::ComparisonB => Some(&mut self.document_b),
            DocumentSlot::Primary => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Extracted text of the current document
    pub document: Option<String>,
    pub result: Option<AnalysisResult>,
    /// Live Q&A transcript, oldest first
    pub qa: Vec<QaEntry>,
    pub explanation: ExplanationDialog,
    /// Most recent first
    pub history: Vec<AnalysisHistoryEntry>,
    pub active_id: Option<EntryId>,
    /// Bumped whenever the live analysis state is replaced
    pub analysis_version: u64,
    pub analyzing: bool,
    pub comparison: ComparisonState,
}

impl SessionState {
    pub fn active_entry(&self) -> Option<&AnalysisHistoryEntry> {
        let id = self.active_id?;
        self.history.iter().find(|e| e.id == id)
    }

    pub fn entry(&self, id: EntryId) -> Option<&AnalysisHistoryEntry> {
        self.history.iter().find(|e| e.id == id)
    }

    /// Version marker of the lane a slot belongs to
    pub fn lane_version(&self, slot: DocumentSlot) -> u64 {
        match slot {
            DocumentSlot::Primary => self.analysis_version,
            DocumentSlot::ComparisonA | DocumentSlot::ComparisonB => self.comparison.version,
        }
    }

    pub fn document_text(&self, slot: DocumentSlot) -> Option<&str> {
        match slot {
            DocumentSlot::Primary => self.document.as_deref(),
            DocumentSlot::ComparisonA => self.comparison.document_a.as_deref(),
            DocumentSlot::ComparisonB => self.comparison.document_b.as_deref(),
        }
    }

    /// Clear live analysis state and move to a new version; history stays
    fn reset_live(&mut self) {
        self.document = None;
        self.result = None;
        self.qa.clear();
        self.explanation = ExplanationDialog::Closed;
        self.active_id = None;
        self.analyzing = false;
        self.analysis_version += 1;
    }

    fn check_analysis_version(&self, version: u64) -> Result<(), SessionError> {
        if version == self.analysis_version {
            Ok(())
        } else {
            debug!(version, current = self.analysis_version, "check_analysis_version: stale");
            Err(SessionError::Stale)
        }
    }

    fn check_comparison_version(&self, version: u64) -> Result<(), SessionError> {
        if version == self.comparison.version {
            Ok(())
        } else {
            debug!(version, current = self.comparison.version, "check_comparison_version: stale");
            Err(SessionError::Stale)
        }
    }
}

/// Every way the session can change
#[derive(Debug, Clone)]
pub enum Transition {
    /// A new file is being read into `slot`; earlier results for that lane become stale
    UploadStarted { slot: DocumentSlot },
    DocumentLoaded {
        slot: DocumentSlot,
        version: u64,
        text: String,
    },
    AnalysisStarted,
    AnalysisCompleted {
        version: u64,
        entry: AnalysisHistoryEntry,
    },
    /// Any sub-operation failed: the document is dropped and nothing is recorded
    AnalysisFailed { version: u64 },
    ExplainStarted { clause: String },
    ExplainCompleted {
        version: u64,
        clause: String,
        explanation: String,
    },
    ExplainFailed { version: u64, clause: String },
    DismissExplanation,
    QuestionAnswered {
        entry_id: EntryId,
        question: String,
        answer: String,
    },
    LoadEntry { id: EntryId },
    DeleteEntry { id: EntryId },
    /// Start a new analysis; history is kept
    Reset,
    ComparisonStarted,
    ComparisonCompleted {
        version: u64,
        comparison: Vec<ComparisonPoint>,
    },
    ComparisonFailed { version: u64 },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadStarted { .. } => "UploadStarted",
            Self::DocumentLoaded { .. } => "DocumentLoaded",
            Self::AnalysisStarted => "AnalysisStarted",
            Self::AnalysisCompleted { .. } => "AnalysisCompleted",
            Self::AnalysisFailed { .. } => "AnalysisFailed",
            Self::ExplainStarted { .. } => "ExplainStarted",
            Self::ExplainCompleted { .. } => "ExplainCompleted",
            Self::ExplainFailed { .. } => "ExplainFailed",
            Self::DismissExplanation => "DismissExplanation",
            Self::QuestionAnswered { .. } => "QuestionAnswered",
            Self::LoadEntry { .. } => "LoadEntry",
            Self::DeleteEntry { .. } => "DeleteEntry",
            Self::Reset => "Reset",
            Self::ComparisonStarted => "ComparisonStarted",
            Self::ComparisonCompleted { .. } => "ComparisonCompleted",
            Self::ComparisonFailed { .. } => "ComparisonFailed",
        }
    }
}

fn is_blank(text: Option<&str>) -> bool {
    text.is_none_or(|t| t.trim().is_empty())
}

/// Apply one transition and return the next state
pub fn reduce(state: &SessionState, transition: Transition) -> Result<SessionState, SessionError> {
    debug!(transition = transition.name(), "reduce: called");
    let mut next = state.clone();

    match transition {
        Transition::UploadStarted { slot } => match slot {
            DocumentSlot::Primary => next.reset_live(),
            DocumentSlot::ComparisonA | DocumentSlot::ComparisonB => {
                if let Some(doc) = next.comparison.slot_mut(slot) {
                    *doc = None;
                }
                next.comparison.result = None;
                next.comparison.in_flight = false;
                next.comparison.version += 1;
            }
        },

        Transition::DocumentLoaded { slot, version, text } => match slot {
            DocumentSlot::Primary => {
                next.check_analysis_version(version)?;
                next.document = Some(text);
            }
            DocumentSlot::ComparisonA | DocumentSlot::ComparisonB => {
                next.check_comparison_version(version)?;
                if let Some(doc) = next.comparison.slot_mut(slot) {
                    *doc = Some(text);
                }
            }
        },

        Transition::AnalysisStarted => {
            if next.analyzing {
                return Err(SessionError::Busy("An analysis is already running.".to_string()));
            }
            if is_blank(next.document.as_deref()) {
                return Err(SessionError::Precondition("Document text cannot be empty.".to_string()));
            }
            next.analyzing = true;
        }

        Transition::AnalysisCompleted { version, entry } => {
            next.check_analysis_version(version)?;
            next.document = Some(entry.document_text.clone());
            next.result = Some(entry.result.clone());
            next.qa = entry.qa_history.clone();
            next.explanation = ExplanationDialog::Closed;
            next.active_id = Some(entry.id);
            next.analyzing = false;
            next.history.insert(0, entry);
        }

        Transition::AnalysisFailed { version } => {
            next.check_analysis_version(version)?;
            next.reset_live();
        }

        Transition::ExplainStarted { clause } => {
            if next.active_id.is_none() {
                return Err(SessionError::Precondition(
                    "Analyze a document before explaining a clause.".to_string(),
                ));
            }
            if clause.trim().is_empty() {
                return Err(SessionError::Precondition("Select a clause to explain.".to_string()));
            }
            next.explanation = ExplanationDialog::Loading { clause };
        }

        Transition::ExplainCompleted {
            version,
            clause,
            explanation,
        } => {
            next.check_analysis_version(version)?;
            if !next.explanation.is_loading(&clause) {
                return Err(SessionError::Stale);
            }
            next.explanation = ExplanationDialog::Shown { clause, explanation };
        }

        Transition::ExplainFailed { version, clause } => {
            next.check_analysis_version(version)?;
            if !next.explanation.is_loading(&clause) {
                return Err(SessionError::Stale);
            }
            next.explanation = ExplanationDialog::Closed;
        }

        Transition::DismissExplanation => next.explanation = ExplanationDialog::Closed,

        Transition::QuestionAnswered {
            entry_id,
            question,
            answer,
        } => {
            if next.active_id != Some(entry_id) {
                return Err(SessionError::Stale);
            }
            let qa = QaEntry { question, answer };
            let entry = next
                .history
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| SessionError::NotFound(entry_id.to_string()))?;
            entry.qa_history.push(qa.clone());
            next.qa.push(qa);
        }

        Transition::LoadEntry { id } => {
            let entry = next
                .entry(id)
                .cloned()
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            next.reset_live();
            next.document = Some(entry.document_text);
            next.result = Some(entry.result);
            next.qa = entry.qa_history;
            next.active_id = Some(id);
        }

        Transition::DeleteEntry { id } => {
            let before = next.history.len();
            next.history.retain(|e| e.id != id);
            if next.history.len() == before {
                return Err(SessionError::NotFound(id.to_string()));
            }
            if next.active_id == Some(id) {
                next.reset_live();
            }
        }

        Transition::Reset => next.reset_live(),

        Transition::ComparisonStarted => {
            if next.comparison.in_flight {
                return Err(SessionError::Busy("A comparison is already running.".to_string()));
            }
            if is_blank(next.comparison.document_a.as_deref()) || is_blank(next.comparison.document_b.as_deref()) {
                return Err(SessionError::Precondition(
                    "Please upload both documents before comparing.".to_string(),
                ));
            }
            next.comparison.in_flight = true;
            next.comparison.result = None;
        }

        Transition::ComparisonCompleted { version, comparison } => {
            next.check_comparison_version(version)?;
            next.comparison.result = Some(comparison);
            next.comparison.in_flight = false;
        }

        Transition::ComparisonFailed { version } => {
            next.check_comparison_version(version)?;
            next.comparison.in_flight = false;
        }
    }

    check_invariants(&next).map_err(SessionError::InvariantViolated)?;
    Ok(next)
}

/// The live analysis mirrors the active history entry, or is empty without one
pub fn check_invariants(state: &SessionState) -> Result<(), String> {
    let mut seen = HashSet::new();
    for entry in &state.history {
        if !seen.insert(entry.id) {
            return Err(format!("duplicate history id {}", entry.id));
        }
    }

    match state.active_id {
        Some(id) => {
            let entry = state
                .entry(id)
                .ok_or_else(|| format!("active id {} is not in history", id))?;
            if state.document.as_deref() != Some(entry.document_text.as_str()) {
                return Err("live document differs from active entry".to_string());
            }
            if state.result.as_ref() != Some(&entry.result) {
                return Err("live result differs from active entry".to_string());
            }
            if state.qa != entry.qa_history {
                return Err("live Q&A differs from active entry".to_string());
            }
        }
        None => {
            if state.result.is_some() {
                return Err("result present without an active entry".to_string());
            }
            if !state.qa.is_empty() {
                return Err("Q&A present without an active entry".to_string());
            }
            if state.explanation != ExplanationDialog::Closed {
                return Err("explanation open without an active entry".to_string());
            }
        }
    }

    if state.analyzing && state.document.is_none() {
        return Err("analysis running without a document".to_string());
    }

    Ok(())
}
