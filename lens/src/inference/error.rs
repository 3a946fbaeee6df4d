//! Inference error types

use thiserror::Error;

use crate::llm::LlmError;
use crate::operations::Operation;

/// Failure of a single operation invocation, tagged with the operation
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The provider answered but the answer does not match the declared shape
    #[error("{operation}: invalid output: {message}")]
    Validation { operation: Operation, message: String },

    /// The provider could not be reached or refused the request
    #[error("{operation}: provider error: {source}")]
    Provider {
        operation: Operation,
        #[source]
        source: LlmError,
    },
}

impl InferenceError {
    pub fn validation(operation: Operation, message: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            message: message.into(),
        }
    }

    pub fn provider(operation: Operation, source: LlmError) -> Self {
        Self::Provider { operation, source }
    }

    /// The operation that failed
    pub fn operation(&self) -> Operation {
        match self {
            Self::Validation { operation, .. } | Self::Provider { operation, .. } => *operation,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
