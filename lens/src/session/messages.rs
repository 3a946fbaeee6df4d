//! Session store messages
//!
//! Commands and responses for the actor pattern.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

use super::state::{SessionState, Transition};
use crate::orchestrator::Notification;

/// Errors from session transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("History entry not found: {0}")]
    NotFound(String),

    /// The same kind of work is already running in this lane
    #[error("{0}")]
    Busy(String),

    /// The result belongs to a document or entry that has since been replaced
    #[error("Result is stale and was discarded")]
    Stale,

    /// The intent cannot run in the current state
    #[error("{0}")]
    Precondition(String),

    #[error("Session invariant violated: {0}")]
    InvariantViolated(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from session operations
pub type SessionResponse<T> = Result<T, SessionError>;

/// Commands sent to the SessionStore actor
#[derive(Debug)]
pub enum SessionCommand {
    Dispatch {
        transition: Transition,
        reply: oneshot::Sender<SessionResponse<Arc<SessionState>>>,
    },
    Snapshot {
        reply: oneshot::Sender<Arc<SessionState>>,
    },
    Notify {
        notification: Notification,
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}
