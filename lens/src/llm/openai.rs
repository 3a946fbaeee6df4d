//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::http::Transport;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Model families that take `max_completion_tokens` instead of `max_tokens`
const COMPLETION_TOKEN_PREFIXES: [&str; 3] = ["gpt-5", "o1", "o3"];

/// OpenAI Chat Completions client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    endpoint: String,
    transport: Transport,
    max_tokens: u32,
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
            transport: Transport::new(config.timeout_ms, config.max_retries)?,
            max_tokens: config.max_tokens,
        })
    }

    /// Chat body with the system prompt as the first message
    ///
    /// JSON requests set `response_format` so the model emits a bare object.
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        debug!(%self.model, %request.max_tokens, json_output = request.json_output, "build_request_body: called");
        let messages: Vec<Value> = std::iter::once(json!({ "role": "system", "content": request.system_prompt }))
            .chain(
                request
                    .messages
                    .iter()
                    .map(|m| json!({ "role": m.role.as_str(), "content": m.content })),
            )
            .collect();

        let limit_key = if COMPLETION_TOKEN_PREFIXES.iter().any(|p| self.model.starts_with(p)) {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };

        let mut body = json!({ "model": self.model, "messages": messages });
        body[limit_key] = json!(request.max_tokens.min(self.max_tokens));
        if request.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    /// First choice only; a reply without choices is an empty end of turn
    fn parse_response(reply: ChatReply) -> CompletionResponse {
        debug!(choices = reply.choices.len(), "parse_response: called");
        let (content, stop_reason) = reply
            .choices
            .into_iter()
            .next()
            .map(|c| (c.message.content, StopReason::from_openai(c.finish_reason.as_deref())))
            .unwrap_or((None, StopReason::EndTurn));

        let usage = reply
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, "complete: called");
        let body = self.build_request_body(&request);
        let headers = [("authorization", format!("Bearer {}", self.api_key))];
        let reply: ChatReply = self.transport.post_json(&self.endpoint, &headers, &body).await?;
        Ok(Self::parse_response(reply))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Chat Completions reply

#[derive(Debug, Deserialize)]
struct ChatReply {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
