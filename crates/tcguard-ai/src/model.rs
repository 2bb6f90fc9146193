//! The model collaborator: a chat-style text generator behind [`ModelClient`].

use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model returned no text")]
    EmptyResponse,
}

/// Model names and sampling parameters, injected at startup.
///
/// Analysis and chat deliberately use different models.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub analysis_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// One prior turn of a conversation. `role` is `user` or `model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: String,
    pub parts: Vec<String>,
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    /// System instruction, sent separately from the conversation.
    pub system: Option<String>,
    pub history: Vec<ChatTurn>,
    /// Final user turn.
    pub user: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Ask the model for `application/json` output.
    pub json_output: bool,
}

impl ModelRequest {
    /// A request for `model` carrying the sampling parameters from `config`.
    pub fn new(config: &ModelConfig, model: &str, user: String) -> Self {
        Self {
            model: model.to_string(),
            system: None,
            history: Vec::new(),
            user,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            json_output: false,
        }
    }
}

/// A text-generation backend. One call, one reply; no retries.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_distinct_models() {
        let config = ModelConfig::default();
        assert_eq!(config.analysis_model, "gemini-flash-latest");
        assert_eq!(config.chat_model, "gemini-1.5-pro");
        assert_ne!(config.analysis_model, config.chat_model);
    }

    #[test]
    fn request_inherits_sampling_parameters() {
        let config = ModelConfig {
            temperature: 0.7,
            max_output_tokens: 1024,
            ..ModelConfig::default()
        };
        let req = ModelRequest::new(&config, "m", "hi".into());
        assert_eq!(req.model, "m");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_output_tokens, 1024);
        assert!(req.system.is_none());
        assert!(!req.json_output);
    }
}
