//! Structured inference
//!
//! The capability every operation is invoked through: given an operation, a
//! typed input record and an expected output shape, return a record or fail.
//! The provider is non-deterministic and nothing here caches.

use async_trait::async_trait;
use serde_json::Value;

mod error;
mod json;
mod llm;

pub use error::InferenceError;
pub use json::extract_json_object;
pub use llm::LlmInference;

use crate::operations::Operation;

#[async_trait]
pub trait InferenceCapability: Send + Sync {
    /// Produce a raw output record for `operation`
    ///
    /// `shape` is the JSON schema the record must satisfy. Callers still
    /// validate the result; implementations only need to return an object.
    async fn infer(&self, operation: Operation, input: &Value, shape: &Value) -> Result<Value, InferenceError>;
}
