// ABOUTME: The post-detail view controller: load, delete, share, and summary orchestration for one page session.
// ABOUTME: Collaborator failures become view state; stale load results are discarded via sequence tokens.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;

use crate::model::Post;
use crate::present::share_excerpt;
use crate::sanitize::Sanitizer;
use crate::shell::{
    Clipboard, Confirmation, NavTarget, Navigator, RevealHook, SharePayload, ShareSurface,
};
use crate::store::{PostStore, StoreError};
use crate::summary::{SummarizerService, SummaryOrchestrator, SummaryOutcome, SummaryState};
use crate::view::{PageView, Viewer};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load the post. Please try again later.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete the post. Please try again later.";
pub const NOT_FOUND_MESSAGE: &str = "Post not found";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this post?";

/// Errors reported by controller operations. The view state has already been
/// updated by the time one of these is returned.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("post identifier is required")]
    MissingIdentifier,

    #[error("failed to load post: {0}")]
    Load(#[source] StoreError),

    #[error("load superseded by a newer request")]
    Superseded,

    #[error("no post is loaded")]
    NoPost,

    #[error("a delete is already in progress")]
    DeleteInProgress,
}

/// State owned by one page session's controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Identifier of the most recently requested post.
    pub post_id: Option<String>,
    pub post: Option<Post>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_deleting: bool,
    /// Set once a delete succeeded; the page is expected to go away.
    pub deleted: bool,
}

impl ViewState {
    /// Freshly mounted: loading until the first fetch completes.
    pub fn mounting() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined the confirmation.
    Cancelled,
    Deleted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedLink,
    /// Neither the share surface nor the clipboard worked. Never shown to the user.
    Failed,
}

/// Controller for a single mounted post page.
pub struct PostViewController {
    store: Arc<dyn PostStore>,
    sanitizer: Arc<dyn Sanitizer>,
    summaries: SummaryOrchestrator,
    view: watch::Sender<ViewState>,
    load_seq: AtomicU64,
}

impl PostViewController {
    pub fn new(
        store: Arc<dyn PostStore>,
        sanitizer: Arc<dyn Sanitizer>,
        summarizer: Arc<dyn SummarizerService>,
    ) -> Self {
        let (view, _) = watch::channel(ViewState::mounting());
        Self {
            store,
            sanitizer,
            summaries: SummaryOrchestrator::new(summarizer),
            view,
            load_seq: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn summary_state(&self) -> SummaryState {
        self.summaries.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    pub fn summaries(&self) -> &SummaryOrchestrator {
        &self.summaries
    }

    /// Wait until no load is in flight and return the settled state.
    pub async fn settled(&self) -> ViewState {
        let mut rx = self.view.subscribe();
        // The sender lives in self, so the channel cannot close while we wait.
        match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Load the post with the given id. A newer call supersedes this one: its
    /// result is discarded and the newer call owns the `loading` flag.
    pub async fn load(&self, id: Option<&str>) -> Result<(), ControllerError> {
        let token = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
            tracing::warn!("post load requested without an identifier");
            self.view.send_modify(|s| {
                s.post_id = None;
                s.post = None;
                s.error = Some(LOAD_FAILED_MESSAGE.to_string());
                s.loading = false;
            });
            return Err(ControllerError::MissingIdentifier);
        };

        self.view.send_modify(|s| {
            s.post_id = Some(id.to_string());
            s.loading = true;
        });

        let result = self.store.get_post(id).await;

        let committed = self.view.send_if_modified(|s| {
            if self.load_seq.load(Ordering::SeqCst) != token {
                return false;
            }
            match &result {
                Ok(post) => {
                    s.post = Some(post.clone());
                    s.error = None;
                }
                Err(_) => {
                    s.post = None;
                    s.error = Some(LOAD_FAILED_MESSAGE.to_string());
                }
            }
            s.loading = false;
            true
        });

        if !committed {
            tracing::debug!(post_id = id, token, "discarding superseded post load");
            return Err(ControllerError::Superseded);
        }

        match result {
            Ok(_) => {
                tracing::info!(post_id = id, "post loaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(post_id = id, error = %e, "failed to load post");
                Err(ControllerError::Load(e))
            }
        }
    }

    /// Delete the loaded post after confirmation. On success the navigator is
    /// sent to the collection root exactly once.
    pub async fn delete(
        &self,
        confirmation: &dyn Confirmation,
        navigator: &dyn Navigator,
    ) -> Result<DeleteOutcome, ControllerError> {
        let (post_id, deleting) = {
            let state = self.view.borrow();
            (state.post.as_ref().map(|p| p.id.clone()), state.is_deleting)
        };
        let Some(post_id) = post_id else {
            return Err(ControllerError::NoPost);
        };
        if deleting {
            return Err(ControllerError::DeleteInProgress);
        }

        if !confirmation.confirm(DELETE_PROMPT).await {
            tracing::debug!(post_id = %post_id, "delete cancelled by user");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.view.send_modify(|s| s.is_deleting = true);

        match self.store.delete_post(&post_id).await {
            Ok(()) => {
                tracing::info!(post_id = %post_id, "post deleted");
                self.view.send_modify(|s| s.deleted = true);
                navigator.navigate(NavTarget::Home);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "failed to delete post");
                self.view.send_modify(|s| {
                    s.error = Some(DELETE_FAILED_MESSAGE.to_string());
                    s.is_deleting = false;
                });
                Ok(DeleteOutcome::Failed)
            }
        }
    }

    /// The payload offered to a native share surface, if a post is loaded.
    pub fn share_payload(&self, page_url: &str) -> Option<SharePayload> {
        self.view.borrow().post.as_ref().map(|post| SharePayload {
            title: post.title.clone(),
            text: share_excerpt(&post.content),
            url: page_url.to_string(),
        })
    }

    /// Share the post through `surface`, falling back to copying the page URL.
    /// Failures are logged and never surfaced.
    pub async fn share(
        &self,
        page_url: &str,
        surface: &dyn ShareSurface,
        clipboard: &dyn Clipboard,
    ) -> ShareOutcome {
        if let Some(payload) = self.share_payload(page_url) {
            match surface.share(&payload).await {
                Ok(()) => return ShareOutcome::Shared,
                Err(e) => tracing::debug!(error = %e, "share surface failed, copying link"),
            }
        }

        match clipboard.write_text(page_url).await {
            Ok(()) => ShareOutcome::CopiedLink,
            Err(e) => {
                tracing::debug!(error = %e, "clipboard fallback failed");
                ShareOutcome::Failed
            }
        }
    }

    /// Summarize the currently loaded post. No-op without a post.
    pub async fn generate_summary(&self, reveal: &dyn RevealHook) -> SummaryOutcome {
        let post = self.view.borrow().post.clone();
        self.summaries.generate(post.as_ref(), reveal).await
    }

    /// Render the current state for `viewer`.
    pub fn render(&self, viewer: &Viewer) -> PageView {
        let view = self.state();
        let summary = self.summaries.state();
        PageView::build(&view, &summary, viewer, self.sanitizer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::AmmoniaSanitizer;
    use crate::shell::{Preconfirmed, RecordedNavigation, RevealFlag, ShareError};
    use crate::summary::tests::{ScriptedSummarizer, sample_post};
    use crate::summary::{SUMMARY_FAILURE_NOTICE, SummarizeError, Summary};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeStore {
        posts: Mutex<HashMap<String, Post>>,
        fail_delete: bool,
        gets: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl FakeStore {
        fn with(post: Post) -> Self {
            let store = Self::default();
            store.posts.lock().unwrap().insert(post.id.clone(), post);
            store
        }
    }

    #[async_trait]
    impl PostStore for FakeStore {
        async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.posts
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.to_string()))
        }

        async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                return Err(StoreError::Forbidden);
            }
            self.posts.lock().unwrap().remove(id);
            Ok(())
        }

        async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
            Ok(self.posts.lock().unwrap().values().cloned().collect())
        }
    }

    /// Store whose fetches block until the test releases them, in call order.
    struct GatedStore {
        gates: Mutex<Vec<oneshot::Receiver<Result<Post, StoreError>>>>,
    }

    #[async_trait]
    impl PostStore for GatedStore {
        async fn get_post(&self, _id: &str) -> Result<Post, StoreError> {
            let gate = self.gates.lock().unwrap().remove(0);
            gate.await
                .unwrap_or_else(|_| Err(StoreError::Transport("gate dropped".into())))
        }

        async fn delete_post(&self, _id: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
            Ok(vec![])
        }
    }

    struct FailingSurface;

    #[async_trait]
    impl ShareSurface for FailingSurface {
        async fn share(&self, _payload: &SharePayload) -> Result<(), ShareError> {
            Err(ShareError::Unavailable)
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        shared: Mutex<Vec<SharePayload>>,
    }

    #[async_trait]
    impl ShareSurface for RecordingSurface {
        async fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
            self.shared.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        texts: Mutex<Vec<String>>,
        broken: bool,
    }

    #[async_trait]
    impl Clipboard for RecordingClipboard {
        async fn write_text(&self, text: &str) -> Result<(), ShareError> {
            if self.broken {
                return Err(ShareError::Failed("denied".into()));
            }
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn controller(store: Arc<dyn PostStore>) -> PostViewController {
        controller_with(store, vec![])
    }

    fn controller_with(
        store: Arc<dyn PostStore>,
        summaries: Vec<Result<String, SummarizeError>>,
    ) -> PostViewController {
        PostViewController::new(
            store,
            Arc::new(AmmoniaSanitizer),
            Arc::new(ScriptedSummarizer::new(summaries)),
        )
    }

    #[tokio::test]
    async fn mounts_in_loading_state() {
        let ctrl = controller(Arc::new(FakeStore::default()));
        assert!(ctrl.state().loading);
        assert!(ctrl.render(&Viewer::anonymous()).is_loading());
    }

    #[tokio::test]
    async fn load_success_sets_post_and_clears_error() {
        let post = sample_post("<p>Hello</p>");
        let ctrl = controller(Arc::new(FakeStore::with(post.clone())));

        ctrl.load(Some("p1")).await.unwrap();

        let state = ctrl.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.post, Some(post));
    }

    #[tokio::test]
    async fn load_failure_sets_generic_error() {
        let ctrl = controller(Arc::new(FakeStore::default()));

        let result = ctrl.load(Some("missing")).await;

        assert!(matches!(result, Err(ControllerError::Load(StoreError::NotFound(_)))));
        let state = ctrl.state();
        assert!(!state.loading);
        assert!(state.post.is_none());
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
        // Backend detail is never shown
        assert!(!state.error.unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn load_without_identifier_never_touches_store() {
        let store = Arc::new(FakeStore::default());
        let ctrl = controller(store.clone());

        for id in [None, Some(""), Some("   ")] {
            let result = ctrl.load(id).await;
            assert!(matches!(result, Err(ControllerError::MissingIdentifier)));
        }

        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
        let state = ctrl.state();
        assert!(!state.loading);
        assert!(state.post.is_none());
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
        assert!(matches!(ctrl.render(&Viewer::anonymous()), PageView::Error(_)));
    }

    #[tokio::test]
    async fn reload_after_failure_clears_error() {
        let store = Arc::new(FakeStore::default());
        let ctrl = controller(store.clone());
        let _ = ctrl.load(Some("p1")).await;
        assert!(ctrl.state().error.is_some());

        store
            .posts
            .lock()
            .unwrap()
            .insert("p1".to_string(), sample_post("<p>x</p>"));
        ctrl.load(Some("p1")).await.unwrap();

        assert!(ctrl.state().error.is_none());
        assert!(ctrl.state().post.is_some());
    }

    #[tokio::test]
    async fn stale_load_cannot_overwrite_newer_one() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let store = Arc::new(GatedStore {
            gates: Mutex::new(vec![first_rx, second_rx]),
        });
        let ctrl = Arc::new(controller(store));

        let c1 = Arc::clone(&ctrl);
        let first = tokio::spawn(async move { c1.load(Some("old")).await });
        tokio::task::yield_now().await;
        let c2 = Arc::clone(&ctrl);
        let second = tokio::spawn(async move { c2.load(Some("new")).await });
        tokio::task::yield_now().await;

        let mut newer = sample_post("<p>new</p>");
        newer.id = "new".to_string();
        second_tx.send(Ok(newer.clone())).unwrap();
        second.await.unwrap().unwrap();

        let mut older = sample_post("<p>old</p>");
        older.id = "old".to_string();
        first_tx.send(Ok(older)).unwrap();
        assert!(matches!(first.await.unwrap(), Err(ControllerError::Superseded)));

        let state = ctrl.state();
        assert_eq!(state.post, Some(newer));
        assert_eq!(state.post_id.as_deref(), Some("new"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn settled_waits_for_load() {
        let (tx, rx) = oneshot::channel();
        let store = Arc::new(GatedStore {
            gates: Mutex::new(vec![rx]),
        });
        let ctrl = Arc::new(controller(store));

        let c = Arc::clone(&ctrl);
        let load = tokio::spawn(async move { c.load(Some("p1")).await });
        tokio::task::yield_now().await;
        assert!(ctrl.state().loading);

        tx.send(Ok(sample_post("<p>x</p>"))).unwrap();
        let state = ctrl.settled().await;
        assert!(!state.loading);
        assert!(state.post.is_some());
        load.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn delete_without_confirmation_is_noop() {
        let store = Arc::new(FakeStore::with(sample_post("<p>x</p>")));
        let ctrl = controller(store.clone());
        ctrl.load(Some("p1")).await.unwrap();
        let nav = RecordedNavigation::new();

        let outcome = ctrl.delete(&Preconfirmed(false), &nav).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert!(!ctrl.state().is_deleting);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert!(nav.targets().is_empty());
    }

    #[tokio::test]
    async fn delete_success_navigates_home_once() {
        let store = Arc::new(FakeStore::with(sample_post("<p>x</p>")));
        let ctrl = controller(store.clone());
        ctrl.load(Some("p1")).await.unwrap();
        let nav = RecordedNavigation::new();

        let outcome = ctrl.delete(&Preconfirmed(true), &nav).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(nav.targets(), vec![NavTarget::Home]);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        let state = ctrl.state();
        assert!(state.deleted);
        assert!(state.is_deleting);
    }

    #[tokio::test]
    async fn delete_failure_keeps_post_and_reenables() {
        let post = sample_post("<p>x</p>");
        let store = Arc::new(FakeStore {
            fail_delete: true,
            ..FakeStore::with(post.clone())
        });
        let ctrl = controller(store);
        ctrl.load(Some("p1")).await.unwrap();
        let nav = RecordedNavigation::new();

        let outcome = ctrl.delete(&Preconfirmed(true), &nav).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Failed);
        let state = ctrl.state();
        assert!(!state.is_deleting);
        assert_eq!(state.error.as_deref(), Some(DELETE_FAILED_MESSAGE));
        assert_eq!(state.post, Some(post));
        assert!(nav.targets().is_empty());
    }

    #[tokio::test]
    async fn delete_without_post_is_rejected() {
        let store = Arc::new(FakeStore::default());
        let ctrl = controller(store.clone());
        let _ = ctrl.load(Some("nope")).await;

        let result = ctrl
            .delete(&Preconfirmed(true), &RecordedNavigation::new())
            .await;

        assert!(matches!(result, Err(ControllerError::NoPost)));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn share_uses_surface_with_excerpt() {
        let content = "x".repeat(250);
        let ctrl = controller(Arc::new(FakeStore::with(sample_post(&content))));
        ctrl.load(Some("p1")).await.unwrap();
        let surface = RecordingSurface::default();
        let clipboard = RecordingClipboard::default();

        let outcome = ctrl
            .share("http://localhost/posts/p1", &surface, &clipboard)
            .await;

        assert_eq!(outcome, ShareOutcome::Shared);
        let shared = surface.shared.lock().unwrap();
        assert_eq!(shared[0].title, "Hello");
        assert_eq!(shared[0].text, format!("{}...", "x".repeat(100)));
        assert_eq!(shared[0].url, "http://localhost/posts/p1");
        assert!(clipboard.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn share_falls_back_to_clipboard() {
        let ctrl = controller(Arc::new(FakeStore::with(sample_post("<p>x</p>"))));
        ctrl.load(Some("p1")).await.unwrap();
        let clipboard = RecordingClipboard::default();

        let outcome = ctrl
            .share("http://localhost/posts/p1", &FailingSurface, &clipboard)
            .await;

        assert_eq!(outcome, ShareOutcome::CopiedLink);
        assert_eq!(
            *clipboard.texts.lock().unwrap(),
            vec!["http://localhost/posts/p1".to_string()]
        );
    }

    #[tokio::test]
    async fn share_failure_is_silent() {
        let ctrl = controller(Arc::new(FakeStore::with(sample_post("<p>x</p>"))));
        ctrl.load(Some("p1")).await.unwrap();
        let clipboard = RecordingClipboard {
            broken: true,
            ..Default::default()
        };

        let outcome = ctrl.share("http://x", &FailingSurface, &clipboard).await;

        assert_eq!(outcome, ShareOutcome::Failed);
        assert!(ctrl.state().error.is_none());
    }

    #[tokio::test]
    async fn rendered_content_never_contains_script() {
        let ctrl = controller(Arc::new(FakeStore::with(sample_post(
            "<p>Hello</p><script>evil()</script>",
        ))));
        ctrl.load(Some("p1")).await.unwrap();

        let PageView::Content(content) = ctrl.render(&Viewer::anonymous()) else {
            panic!("expected content");
        };
        assert!(content.content_html.contains("<p>Hello</p>"));
        assert!(!content.content_html.contains("<script"));
    }

    #[tokio::test]
    async fn summary_failure_leaves_post_untouched() {
        let post = sample_post("<p>Body</p>");
        let ctrl = controller_with(
            Arc::new(FakeStore::with(post.clone())),
            vec![Err(SummarizeError::Transport("network down".into()))],
        );
        ctrl.load(Some("p1")).await.unwrap();
        let before = ctrl.render(&Viewer::anonymous());

        let outcome = ctrl.generate_summary(&RevealFlag::new()).await;

        assert_eq!(outcome, SummaryOutcome::Failed);
        let summary = ctrl.summary_state();
        assert!(!summary.loading_summary);
        assert_eq!(summary.summary, Some(Summary::Failed));
        let state = ctrl.state();
        assert_eq!(state.post, Some(post));
        assert!(state.error.is_none());

        let (PageView::Content(before), PageView::Content(after)) =
            (before, ctrl.render(&Viewer::anonymous()))
        else {
            panic!("expected content");
        };
        assert_eq!(before.content_html, after.content_html);
        assert_eq!(after.summary.html.as_deref(), Some(SUMMARY_FAILURE_NOTICE));
        assert!(after.summary.failed);
    }

    #[tokio::test]
    async fn summary_survives_post_reload() {
        let ctrl = controller_with(
            Arc::new(FakeStore::with(sample_post("<p>Body</p>"))),
            vec![Ok("<p>Short</p>".into())],
        );
        ctrl.load(Some("p1")).await.unwrap();
        ctrl.generate_summary(&RevealFlag::new()).await;

        ctrl.load(Some("p1")).await.unwrap();

        assert_eq!(
            ctrl.summary_state().summary,
            Some(Summary::Generated("<p>Short</p>".into()))
        );
    }

    #[tokio::test]
    async fn summary_without_post_is_skipped() {
        let ctrl = controller(Arc::new(FakeStore::default()));
        let _ = ctrl.load(Some("missing")).await;

        let outcome = ctrl.generate_summary(&RevealFlag::new()).await;

        assert_eq!(outcome, SummaryOutcome::Skipped);
        assert!(ctrl.summary_state().summary.is_none());
    }
}
