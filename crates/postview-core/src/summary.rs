// ABOUTME: Drives on-demand AI summaries of a post: prompt, dispatch, fence stripping, and commit.
// ABOUTME: Owns SummaryState; only the most recent generation request may commit its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::Post;
use crate::shell::{REVEAL_DELAY, RevealHook};

/// Tags the summarizer is asked to restrict itself to.
pub const SUMMARY_TAGS: &[&str] = &["h2", "p", "ul", "li", "strong", "em"];

/// Word ceiling given to the summarizer.
pub const SUMMARY_MAX_WORDS: usize = 200;

/// Stored in place of a summary when generation fails. Contains only tags the
/// render gate keeps, so it survives sanitization intact.
pub const SUMMARY_FAILURE_NOTICE: &str =
    "<p><strong>Summary unavailable.</strong> The summary could not be generated. Please try again later.</p>";

/// Errors a summarizer backend can report.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,
}

/// A text-generation backend. Returned text is untrusted and is expected to be
/// HTML, possibly wrapped in a code fence.
#[async_trait]
pub trait SummarizerService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizeError>;

    /// Provider name for logging (e.g. "gemini").
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Build the instruction sent to the summarizer for the given article HTML.
pub fn build_summary_prompt(article_html: &str) -> String {
    let tags = SUMMARY_TAGS
        .iter()
        .map(|t| format!("<{}>", t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an assistant that summarizes blog articles.\n\
         The text below is HTML.\n\
         Return a clear, structured summary written entirely in HTML, using only these tags: {}.\n\
         Do not use any other tags or any attributes.\n\
         Do not exceed {} words.\n\
         \n\
         Original text:\n\
         {}\n",
        tags, SUMMARY_MAX_WORDS, article_html
    )
}

/// Remove a code fence wrapped around generated output, with or without a
/// language tag, and trim surrounding whitespace. A language tag is only
/// recognized on its own line, or as `html` directly before the content.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
            _ => match rest.get(..4) {
                Some(tag) if tag.eq_ignore_ascii_case("html") => &rest[4..],
                _ => rest,
            },
        };
    }

    let text = text.trim_end();
    let text = text.strip_suffix("```").unwrap_or(text);

    text.trim().to_string()
}

/// A committed summary value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Fence-stripped backend output. Still untrusted.
    Generated(String),
    /// Generation failed; renders as [`SUMMARY_FAILURE_NOTICE`].
    Failed,
}

impl Summary {
    pub fn html(&self) -> &str {
        match self {
            Summary::Generated(html) => html,
            Summary::Failed => SUMMARY_FAILURE_NOTICE,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Summary::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryState {
    pub summary: Option<Summary>,
    pub loading_summary: bool,
}

/// What happened to one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// No post was loaded.
    Skipped,
    Generated,
    Failed,
    /// A newer request was dispatched before this one completed; its result
    /// was discarded.
    Superseded,
}

/// Runs the summary request/response cycle for one page session.
pub struct SummaryOrchestrator {
    summarizer: Arc<dyn SummarizerService>,
    state: watch::Sender<SummaryState>,
    seq: AtomicU64,
}

impl SummaryOrchestrator {
    pub fn new(summarizer: Arc<dyn SummarizerService>) -> Self {
        let (state, _) = watch::channel(SummaryState::default());
        Self {
            summarizer,
            state,
            seq: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SummaryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.state.subscribe()
    }

    /// Generate a summary of `post`. Failures are stored as [`Summary::Failed`]
    /// and never returned. `reveal` is called once if the committed value is
    /// new and non-empty.
    pub async fn generate(&self, post: Option<&Post>, reveal: &dyn RevealHook) -> SummaryOutcome {
        let Some(post) = post else {
            return SummaryOutcome::Skipped;
        };

        let token = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.loading_summary = true);

        let prompt = build_summary_prompt(&post.content);
        tracing::info!(
            post_id = %post.id,
            provider = self.summarizer.provider_name(),
            model = self.summarizer.model_name(),
            "requesting summary"
        );

        let (next, outcome) = match self.summarizer.generate(&prompt).await {
            Ok(raw) => {
                let text = strip_code_fences(&raw);
                if text.is_empty() {
                    tracing::warn!(post_id = %post.id, "summarizer returned empty output");
                    (Summary::Failed, SummaryOutcome::Failed)
                } else {
                    (Summary::Generated(text), SummaryOutcome::Generated)
                }
            }
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "summary generation failed");
                (Summary::Failed, SummaryOutcome::Failed)
            }
        };

        let mut changed = false;
        let committed = self.state.send_if_modified(|s| {
            if self.seq.load(Ordering::SeqCst) != token {
                return false;
            }
            changed = s.summary.as_ref() != Some(&next);
            s.summary = Some(next);
            s.loading_summary = false;
            true
        });

        if !committed {
            tracing::debug!(post_id = %post.id, token, "discarding superseded summary");
            return SummaryOutcome::Superseded;
        }

        if changed {
            reveal.reveal(REVEAL_DELAY);
        }

        outcome
    }
}
