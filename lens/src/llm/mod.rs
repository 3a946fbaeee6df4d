//! Model provider clients
//!
//! One stateless `LlmClient` per provider; every analysis call is a single
//! self-contained request.

use std::sync::Arc;

use tracing::{debug, info};

mod anthropic;
pub mod client;
mod error;
mod http;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

const PROVIDERS: [&str; 2] = ["anthropic", "openai"];

/// Build the client named by `llm.provider`
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    let client: Arc<dyn LlmClient> = match config.provider.to_ascii_lowercase().as_str() {
        "anthropic" => Arc::new(AnthropicClient::from_config(config)?),
        "openai" => Arc::new(OpenAIClient::from_config(config)?),
        other => {
            return Err(LlmError::InvalidRequest(format!(
                "Unknown LLM provider '{}' (expected one of: {})",
                other,
                PROVIDERS.join(", ")
            )));
        }
    };
    info!(provider = %config.provider, model = %client.model(), "LLM client ready");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_lists_choices() {
        let config = LlmConfig {
            provider: "watson".to_string(),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider 'watson'"));
        assert!(err.to_string().contains("anthropic, openai"));
    }

    #[test]
    fn test_missing_key_is_invalid_request() {
        let config = LlmConfig {
            provider: "OpenAI".to_string(),
            api_key_env: "LEGALLENS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::InvalidRequest(_))));
    }
}
