//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const SUMMARIZE: &str = include_str!("../../prompts/summarize.pmt");

pub const EXPLAIN_CLAUSE: &str = include_str!("../../prompts/explain-clause.pmt");

pub const ANSWER_QUESTION: &str = include_str!("../../prompts/answer-question.pmt");

pub const DETECT_RISKS: &str = include_str!("../../prompts/detect-risks.pmt");

/// Compliance review against Indian law
pub const CHECK_COMPLIANCE: &str = include_str!("../../prompts/check-compliance.pmt");

pub const COMPARE_DOCUMENTS: &str = include_str!("../../prompts/compare-documents.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "summarize" => Some(SUMMARIZE),
        "explain-clause" => Some(EXPLAIN_CLAUSE),
        "answer-question" => Some(ANSWER_QUESTION),
        "detect-risks" => Some(DETECT_RISKS),
        "check-compliance" => Some(CHECK_COMPLIANCE),
        "compare-documents" => Some(COMPARE_DOCUMENTS),
        _ => None,
    };
    if found.is_none() {
        debug!(%name, "get_embedded: no match found");
    }
    found
}
