// ABOUTME: Summarizer backends implementing postview-core's SummarizerService.
// ABOUTME: Provides the Gemini generateContent adapter plus canned summarizers for tests and offline runs.

pub mod gemini;
pub mod testing;

pub use gemini::GeminiSummarizer;
