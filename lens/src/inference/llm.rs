//! Inference backed by an LLM provider client

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{InferenceCapability, InferenceError, extract_json_object};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StopReason};
use crate::operations::Operation;
use crate::prompts::PromptLoader;

/// Renders the operation's prompt template and asks the provider for JSON
pub struct LlmInference {
    client: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl LlmInference {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        debug!(model = %client.model(), %max_tokens, "LlmInference::new: called");
        Self {
            client,
            prompts,
            max_tokens,
        }
    }

    fn system_prompt(shape: &Value) -> String {
        let schema = serde_json::to_string_pretty(shape).unwrap_or_else(|_| shape.to_string());
        format!(
            "You analyze legal documents for readers without legal training.\n\
             Respond with a single JSON object and nothing else. No markdown, no commentary.\n\
             The object must conform to this JSON schema:\n{}",
            schema
        )
    }
}

#[async_trait]
impl InferenceCapability for LlmInference {
    async fn infer(&self, operation: Operation, input: &Value, shape: &Value) -> Result<Value, InferenceError> {
        debug!(%operation, model = %self.client.model(), "infer: called");

        let prompt = self
            .prompts
            .render(operation.template_name(), input)
            .map_err(|e| InferenceError::provider(operation, LlmError::InvalidRequest(e.to_string())))?;

        let request = CompletionRequest {
            system_prompt: Self::system_prompt(shape),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            json_output: true,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| InferenceError::provider(operation, e))?;
        info!(
            %operation,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "infer: provider replied"
        );

        match response.stop_reason {
            StopReason::MaxTokens => {
                warn!(%operation, "infer: reply truncated at max_tokens");
                return Err(InferenceError::validation(operation, "reply truncated at max_tokens"));
            }
            StopReason::Refusal => {
                warn!(%operation, "infer: provider refused");
                return Err(InferenceError::validation(operation, "provider refused to answer"));
            }
            StopReason::EndTurn | StopReason::StopSequence => {}
        }

        let text = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| InferenceError::validation(operation, "empty reply"))?;

        extract_json_object(&text).ok_or_else(|| {
            debug!(%operation, reply_len = text.len(), "infer: no JSON object in reply");
            InferenceError::validation(operation, "reply is not a JSON object")
        })
    }
}
