//! HTTP client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::model::{ModelClient, ModelError, ModelRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at another host, e.g. a proxy.
    ///
    /// `base_url` should have no trailing slash; one is trimmed if present.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// JSON body for a `generateContent` call.
fn request_body(request: &ModelRequest) -> Value {
    let mut contents: Vec<Value> = request
        .history
        .iter()
        .map(|turn| {
            let parts: Vec<Value> = turn.parts.iter().map(|p| json!({ "text": p })).collect();
            json!({ "role": turn.role, "parts": parts })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": request.user }] }));

    let mut generation = json!({
        "temperature": request.temperature,
        "topP": request.top_p,
        "topK": request.top_k,
        "maxOutputTokens": request.max_output_tokens,
    });
    if request.json_output {
        generation["responseMimeType"] = json!("application/json");
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation,
    });
    if let Some(system) = &request.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

/// Concatenated text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let url = self.endpoint(&request.model);
        info!(url = %url, model = %request.model, "calling gemini");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(request))
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::QuotaExceeded(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&resp.text().await?)?;
        let text = response_text(parsed)?;
        debug!(chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatTurn, ModelConfig};

    fn request() -> ModelRequest {
        let mut req = ModelRequest::new(
            &ModelConfig::default(),
            "gemini-flash-latest",
            "Analyze".into(),
        );
        req.system = Some("You are strict.".into());
        req.json_output = true;
        req
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeminiClient::with_base_url("k".into(), "http://localhost:9000/".into());
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(
            client.endpoint("gemini-1.5-pro"),
            "http://localhost:9000/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn body_carries_system_instruction_and_json_mode() {
        let body = request_body(&request());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are strict.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["topK"], 64);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn body_places_history_before_user_turn() {
        let mut req = request();
        req.system = None;
        req.json_output = false;
        req.history = vec![
            ChatTurn { role: "user".into(), parts: vec!["Is there a fee?".into()] },
            ChatTurn { role: "model".into(), parts: vec!["Yes, $5.".into()] },
        ];
        let body = request_body(&req);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "Analyze");
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(response_text(parsed).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response_text(parsed), Err(ModelError::EmptyResponse)));
    }
}
