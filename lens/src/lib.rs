//! LegalLens - Legal Document Analysis
//!
//! Library crate: the analysis operations, the inference and extraction
//! capabilities they run on, the session store and the orchestrator that
//! ties them together.

pub mod cli;
pub mod config;
pub mod extract;
pub mod inference;
pub mod llm;
pub mod operations;
pub mod orchestrator;
pub mod prompts;
pub mod render;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use extract::{DefaultExtractor, DocumentKind, ExtractionError, ExtractionProgress, TextExtractor};
pub use inference::{InferenceCapability, InferenceError, LlmInference};
pub use operations::{Operation, Severity, SeverityFilter};
pub use orchestrator::{IntentOutcome, Notification, Orchestrator, OutcomeStatus};
pub use session::{DocumentSlot, EntryId, SessionError, SessionEvent, SessionState, SessionStore};
