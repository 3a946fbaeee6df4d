//! Orchestrator
//!
//! Translates one user intent into operation invocations, aggregates their
//! outcomes and commits the result to the session store. Nothing escapes
//! as an error: every intent ends in an [`IntentOutcome`].

mod engine;
mod outcome;

pub use engine::Orchestrator;
pub use outcome::{IntentOutcome, Notification, OutcomeStatus};
