// ABOUTME: Shared application state for the postview HTTP server.
// ABOUTME: Holds the post store, summarizer, sanitizer, and the page session registry.

use std::sync::Arc;

use postview_core::{PostStore, PostViewController, Sanitizer, SummarizerService};

use crate::sessions::SessionRegistry;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub summarizer: Arc<dyn SummarizerService>,
    pub sanitizer: Arc<dyn Sanitizer>,
    pub sessions: SessionRegistry,
    /// Token that marks a viewer as authenticated. `None` means every viewer
    /// is anonymous.
    pub auth_token: Option<String>,
    /// Origin used to build absolute page URLs for sharing.
    pub public_base_url: String,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn PostStore>,
        summarizer: Arc<dyn SummarizerService>,
        sanitizer: Arc<dyn Sanitizer>,
        auth_token: Option<String>,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            summarizer,
            sanitizer,
            sessions: SessionRegistry::default(),
            auth_token,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// A fresh controller for one page mount, sharing this state's collaborators.
    pub fn new_controller(&self) -> PostViewController {
        PostViewController::new(
            Arc::clone(&self.store),
            Arc::clone(&self.sanitizer),
            Arc::clone(&self.summarizer),
        )
    }

    /// Absolute URL of a post's page.
    pub fn page_url(&self, post_id: &str) -> String {
        format!(
            "{}{}",
            self.public_base_url,
            postview_core::present::view_href(post_id)
        )
    }
}
