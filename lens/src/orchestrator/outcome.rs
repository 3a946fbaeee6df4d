//! Intent outcomes and user-visible notifications

use std::sync::Arc;

use serde::Serialize;

use crate::extract::ExtractionError;
use crate::inference::InferenceError;
use crate::operations::Operation;
use crate::session::{SessionError, SessionState};

/// A discrete message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// The failing operation, when one failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            operation: None,
        }
    }

    /// Generic error notification
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// One failed operation, named by its fixed user-facing text
    pub fn operation_failed(operation: Operation) -> Self {
        Self {
            title: operation.notification_title().to_string(),
            message: operation.failure_message().to_string(),
            operation: Some(operation),
        }
    }
}

impl From<&InferenceError> for Notification {
    fn from(err: &InferenceError) -> Self {
        Self::operation_failed(err.operation())
    }
}

impl From<&ExtractionError> for Notification {
    fn from(err: &ExtractionError) -> Self {
        Self::new("Error Reading File", err.to_string())
    }
}

impl From<&SessionError> for Notification {
    fn from(err: &SessionError) -> Self {
        Self::error(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    /// The intent ran and its result was committed
    Completed,
    /// One or more operations failed; see the notifications
    Failed,
    /// The intent could not start (missing input, busy, unknown entry)
    Rejected,
    /// The intent ran but the session moved on, so the result was dropped
    Discarded,
}

/// Aggregated result of one user intent
#[derive(Debug, Clone)]
pub struct IntentOutcome {
    pub status: OutcomeStatus,
    pub notifications: Vec<Notification>,
    /// State after the intent; `None` only once the session store has shut down
    pub state: Option<Arc<SessionState>>,
}

impl IntentOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }
}
