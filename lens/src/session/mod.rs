//! Session state
//!
//! One aggregate holds the live document, the current analysis, the Q&A
//! transcript, the comparison lane and the analysis history. It changes only
//! through [`reduce`], and [`SessionStore`] is the actor that owns it.

mod history;
mod manager;
mod messages;
mod state;

pub use history::{AnalysisHistoryEntry, AnalysisResult, EntryId, QaEntry, derive_title};
pub use manager::{SessionEvent, SessionStore};
pub use messages::{SessionCommand, SessionError, SessionResponse};
pub use state::{ComparisonState, DocumentSlot, ExplanationDialog, SessionState, Transition, check_invariants, reduce};
