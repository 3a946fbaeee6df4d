//! Anthropic Claude API client implementation
//!
//! Implements the LlmClient trait for Anthropic's Messages API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::http::Transport;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    endpoint: String,
    transport: Transport,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client from configuration
    ///
    /// Fails early when the API key variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            transport: Transport::new(config.timeout_ms, config.max_retries)?,
            max_tokens: config.max_tokens,
        })
    }

    /// Messages API body; the schema instructions travel in `system`
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        debug!(%self.model, %request.max_tokens, json_output = request.json_output, "build_request_body: called");
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "system": request.system_prompt,
            "messages": messages,
        })
    }

    /// Join the text blocks of a reply; other block types are dropped
    fn parse_response(reply: AnthropicReply) -> CompletionResponse {
        debug!(?reply.stop_reason, "parse_response: called");
        let text: String = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        CompletionResponse {
            content: Some(text).filter(|t| !t.is_empty()),
            stop_reason: StopReason::from_anthropic(reply.stop_reason.as_deref().unwrap_or("end_turn")),
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, "complete: called");
        let body = self.build_request_body(&request);
        let headers = [
            ("x-api-key", self.api_key.clone()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ];
        let reply: AnthropicReply = self.transport.post_json(&self.endpoint, &headers, &body).await?;
        Ok(Self::parse_response(reply))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Messages API reply

#[derive(Debug, Deserialize)]
struct AnthropicReply {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
