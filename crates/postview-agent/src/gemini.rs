// ABOUTME: Google Gemini API adapter implementing the SummarizerService trait.
// ABOUTME: Sends the summary prompt to generateContent and extracts the first text part.

use async_trait::async_trait;
use serde_json::{Value, json};

use postview_core::{SummarizeError, SummarizerService};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const MAX_TOKENS: u32 = 1024;

/// Google Gemini summarizer. The API key travels in the `x-goog-api-key`
/// header and never appears in URLs or logs.
pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSummarizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiSummarizer {
    /// Create a new GeminiSummarizer reading configuration from environment variables.
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_BASE_URL` (defaults to https://generativelanguage.googleapis.com)
    /// Optional: `GEMINI_MODEL` (defaults to gemini-2.5-flash)
    pub fn from_env() -> Result<Self, SummarizeError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SummarizeError::Unauthorized)?;

        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model))
    }

    /// Create a new GeminiSummarizer with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Build the JSON request body for the Gemini generateContent API.
    pub fn build_request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generation_config": {
                "max_output_tokens": MAX_TOKENS
            }
        })
    }

    /// Pull the generated text out of a generateContent response. Text parts
    /// of the first candidate are concatenated.
    pub fn parse_response(response_body: &Value) -> Result<String, SummarizeError> {
        if let Some(message) = response_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Err(SummarizeError::Backend(message.to_string()));
        }

        let candidate = response_body
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                SummarizeError::InvalidResponse("missing candidates array in response".to_string())
            })?
            .first()
            .ok_or_else(|| SummarizeError::InvalidResponse("empty candidates array".to_string()))?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                SummarizeError::InvalidResponse("missing parts array in content".to_string())
            })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            return Err(SummarizeError::InvalidResponse(
                "no text parts in response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl SummarizerService for GeminiSummarizer {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizeError> {
        let body = Self::build_request_body(prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizeError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SummarizeError::Unauthorized);
        }

        if !status.is_success() {
            // Gemini reports failures as {"error": {"message": ...}}
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&error_body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(String::from)
                })
                .unwrap_or(error_body);
            return Err(SummarizeError::Backend(format!(
                "API error {}: {}",
                status, message
            )));
        }

        let response_body: Value = response.json().await.map_err(|e| {
            SummarizeError::InvalidResponse(format!("failed to parse JSON: {}", e))
        })?;

        tracing::debug!(model = %self.model, "gemini returned a response");
        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;

    #[test]
    fn gemini_summarizer_creation() {
        let summarizer = GeminiSummarizer::new(
            "test-key".to_string(),
            "https://example.com/".to_string(),
            "gemini-test".to_string(),
        );
        assert_eq!(summarizer.provider_name(), "gemini");
        assert_eq!(summarizer.model_name(), "gemini-test");
        assert_eq!(
            summarizer.endpoint(),
            "https://example.com/v1beta/models/gemini-test:generateContent"
        );
        assert!(!format!("{:?}", summarizer).contains("test-key"));
    }

    #[test]
    fn gemini_builds_request_body() {
        let body = GeminiSummarizer::build_request_body("Summarize this");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Summarize this");
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn gemini_parses_text_response() {
        let response = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "<h2>Sum"}, {"text": "mary</h2>"}]
                },
                "finishReason": "STOP"
            }]
        });
        let text = GeminiSummarizer::parse_response(&response).unwrap();
        assert_eq!(text, "<h2>Summary</h2>");
    }

    #[test]
    fn gemini_parses_error_message() {
        let response = json!({"error": {"code": 400, "message": "API key not valid"}});
        let err = GeminiSummarizer::parse_response(&response).unwrap_err();
        assert!(matches!(err, SummarizeError::Backend(ref m) if m == "API key not valid"));
    }

    #[test]
    fn gemini_rejects_response_without_candidates() {
        let err = GeminiSummarizer::parse_response(&json!({})).unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidResponse(_)));

        let err = GeminiSummarizer::parse_response(&json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidResponse(_)));

        let no_text = json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]});
        let err = GeminiSummarizer::parse_response(&no_text).unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidResponse(_)));
    }

    async fn generate_handler(headers: HeaderMap) -> axum::response::Response {
        match headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
            Some("good") => axum::Json(json!({
                "candidates": [{"content": {"parts": [{"text": "<p>ok</p>"}]}}]
            }))
            .into_response(),
            Some("busy") => StatusCode::TOO_MANY_REQUESTS.into_response(),
            Some("broken") => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({"error": {"message": "model overloaded"}})),
            )
                .into_response(),
            _ => StatusCode::FORBIDDEN.into_response(),
        }
    }

    async fn spawn_gemini() -> String {
        let app = Router::new().route(
            "/v1beta/models/{call}",
            post(generate_handler),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn summarizer(base: &str, key: &str) -> GeminiSummarizer {
        GeminiSummarizer::new(key.to_string(), base.to_string(), DEFAULT_MODEL.to_string())
    }

    #[tokio::test]
    async fn gemini_sends_key_in_header() {
        let base = spawn_gemini().await;
        let text = summarizer(&base, "good").generate("prompt").await.unwrap();
        assert_eq!(text, "<p>ok</p>");
    }

    #[tokio::test]
    async fn gemini_maps_http_statuses() {
        let base = spawn_gemini().await;

        assert!(matches!(
            summarizer(&base, "busy").generate("p").await,
            Err(SummarizeError::RateLimited)
        ));
        assert!(matches!(
            summarizer(&base, "nope").generate("p").await,
            Err(SummarizeError::Unauthorized)
        ));
        match summarizer(&base, "broken").generate("p").await {
            Err(SummarizeError::Backend(message)) => assert!(message.contains("model overloaded")),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[cfg(feature = "live-test")]
    async fn gemini_adapter_basic() {
        let summarizer = GeminiSummarizer::from_env().expect("GEMINI_API_KEY must be set");
        let prompt = postview_core::summary::build_summary_prompt("<p>Rust is a systems language.</p>");

        let result = summarizer.generate(&prompt).await;
        assert!(result.is_ok(), "live test failed: {:?}", result.err());
    }
}
