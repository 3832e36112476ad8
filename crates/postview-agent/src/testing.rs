// ABOUTME: Canned summarizers for tests and for running the server without an API key.
// ABOUTME: StubSummarizer echoes a fixed HTML fragment; FailingSummarizer always errors.

use std::sync::Mutex;

use async_trait::async_trait;
use postview_core::{SummarizeError, SummarizerService};

/// A summarizer that returns the same text for every prompt and records the
/// prompts it saw.
#[derive(Debug)]
pub struct StubSummarizer {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_owned(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns a short fenced summary, the shape real models tend to produce.
    pub fn fenced() -> Self {
        Self::new("```html\n<h2>Summary</h2><p>A short summary.</p>\n```")
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SummarizerService for StubSummarizer {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizeError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_owned());
        }
        Ok(self.response.clone())
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

/// A summarizer that is never reachable. Used when no API key is configured.
#[derive(Debug, Default)]
pub struct FailingSummarizer;

#[async_trait]
impl SummarizerService for FailingSummarizer {
    async fn generate(&self, _prompt: &str) -> Result<String, SummarizeError> {
        Err(SummarizeError::Unauthorized)
    }

    fn provider_name(&self) -> &str {
        "none"
    }

    fn model_name(&self) -> &str {
        "none"
    }
}
