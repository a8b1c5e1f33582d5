//! Gemini text-generation client, one instance per API key

use crate::ai::{GenerateError, TextGenerator};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Session bound to a single Gemini API key
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Points the client at a different endpoint (tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, MODEL, self.api_key
        )
    }
}

/// Pulls the generated text out of a generateContent response
fn extract_text(body: &Value) -> Option<String> {
    let text = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?;
    Some(text.to_string())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerateError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Other(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerateError::RateLimited);
        }
        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::Other(e.to_string()))?;

        if !status.is_success() {
            // Quota errors sometimes surface as a 400/403 with an
            // exhausted-quota status in the body
            if text.contains("RESOURCE_EXHAUSTED") || text.contains("RATE_LIMIT") {
                return Err(GenerateError::RateLimited);
            }
            return Err(GenerateError::Other(format!("HTTP {}", status)));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| GenerateError::Other(format!("invalid response body: {}", e)))?;
        extract_text(&body)
            .ok_or_else(|| GenerateError::Other("response contained no candidates".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate_body(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    async fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key")
            .unwrap()
            .with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("generated!")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.generate("prompt").await.unwrap(), "generated!");
    }

    #[tokio::test]
    async fn test_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.generate("prompt").await,
            Err(GenerateError::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_quota_status_in_body_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.generate("prompt").await,
            Err(GenerateError::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_server_error_is_other() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(matches!(
            client.generate("prompt").await,
            Err(GenerateError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_other() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.generate("prompt").await {
            Err(GenerateError::Other(msg)) => assert!(msg.contains("no candidates")),
            other => panic!("expected Other, got {:?}", other),
        }
    }
}
