//! "Ask the contract": questions answered from the supplied contract text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::model::{ChatTurn, ModelClient, ModelConfig, ModelError};
use crate::prompt::build_chat_request;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Google API key is not configured. Chat feature unavailable.")]
    NotConfigured,
    #[error("chat failed: {0}")]
    Model(#[from] ModelError),
}

/// A prior conversation entry. Entries without a role or parts are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub current_question: String,
    pub document_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Clone)]
pub struct ChatService {
    model: Option<Arc<dyn ModelClient>>,
    config: ModelConfig,
}

impl ChatService {
    pub fn new(model: Option<Arc<dyn ModelClient>>, config: ModelConfig) -> Self {
        Self { model, config }
    }

    pub async fn ask(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let model = self.model.as_ref().ok_or(ChatError::NotConfigured)?;
        let history = usable_history(request.history);
        info!(turns = history.len(), "answering contract question");

        let req = build_chat_request(
            &self.config,
            history,
            &request.document_context,
            &request.current_question,
        );
        let answer = model.generate(&req).await.map_err(|e| {
            error!(error = %e, "chat failed");
            ChatError::from(e)
        })?;
        Ok(ChatResponse { answer })
    }
}

fn usable_history(entries: Vec<HistoryEntry>) -> Vec<ChatTurn> {
    entries
        .into_iter()
        .filter_map(|entry| match entry.role {
            Some(role) if !role.is_empty() && !entry.parts.is_empty() => Some(ChatTurn {
                role,
                parts: entry.parts,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::ModelRequest;

    #[derive(Default)]
    struct EchoModel {
        seen: Mutex<Vec<ModelRequest>>,
    }

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok("There is a $5 monthly fee.".into())
        }
    }

    fn request(history: serde_json::Value) -> ChatRequest {
        serde_json::from_value(serde_json::json!({
            "history": history,
            "current_question": "Are there fees?",
            "document_context": "A $5 monthly fee applies."
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn answers_with_model_text() {
        let model = Arc::new(EchoModel::default());
        let svc = ChatService::new(Some(model.clone()), ModelConfig::default());
        let resp = svc.ask(request(serde_json::json!([]))).await.unwrap();
        assert_eq!(resp.answer, "There is a $5 monthly fee.");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].model, "gemini-1.5-pro");
        assert!(seen[0].user.contains("User Question: Are there fees?"));
    }

    #[tokio::test]
    async fn incomplete_history_entries_are_skipped() {
        let model = Arc::new(EchoModel::default());
        let svc = ChatService::new(Some(model.clone()), ModelConfig::default());
        svc.ask(request(serde_json::json!([
            { "role": "user", "parts": ["hello"] },
            { "role": "model" },
            { "parts": ["orphan"] },
            { "role": "model", "parts": ["hi there"] }
        ])))
        .await
        .unwrap();

        let seen = model.seen.lock().unwrap();
        let roles: Vec<&str> = seen[0].history.iter().map(|t| t.role.as_str()).collect();
        assert_eq!(roles, ["user", "model"]);
    }

    #[tokio::test]
    async fn requires_model() {
        let svc = ChatService::new(None, ModelConfig::default());
        assert!(matches!(
            svc.ask(request(serde_json::json!([]))).await,
            Err(ChatError::NotConfigured)
        ));
    }
}
