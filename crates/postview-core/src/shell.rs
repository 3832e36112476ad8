// ABOUTME: Traits for the page shell the controller talks to: navigation, confirmation, sharing, reveal.
// ABOUTME: Includes recording implementations the web layer turns into htmx headers and scripts.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::present::{edit_href, view_href};

/// Delay between committing a new summary and scrolling its panel into view,
/// long enough for the panel to be laid out first.
pub const REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Places the controller can send the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    /// The collection root.
    Home,
    ViewPost(String),
    EditPost(String),
}

impl NavTarget {
    pub fn href(&self) -> String {
        match self {
            NavTarget::Home => "/".to_string(),
            NavTarget::ViewPost(id) => view_href(id),
            NavTarget::EditPost(id) => edit_href(id),
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavTarget);
}

/// Remembers every navigation request in order.
#[derive(Debug, Default)]
pub struct RecordedNavigation {
    targets: Mutex<Vec<NavTarget>>,
}

impl RecordedNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<NavTarget> {
        self.targets
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<NavTarget> {
        self.targets.lock().ok().and_then(|t| t.last().cloned())
    }
}

impl Navigator for RecordedNavigation {
    fn navigate(&self, target: NavTarget) {
        if let Ok(mut targets) = self.targets.lock() {
            targets.push(target);
        }
    }
}

/// Asks the user to confirm a destructive action. Declining is not an error.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmation whose answer was already collected, e.g. by the browser
/// before the request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preconfirmed(pub bool);

#[async_trait]
impl Confirmation for Preconfirmed {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Content handed to a native share surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share surface unavailable")]
    Unavailable,

    #[error("share failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ShareSurface: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

/// Scrolls the summary panel into view. Called by the summary orchestrator
/// right after a new summary value is committed.
pub trait RevealHook: Send + Sync {
    fn reveal(&self, delay: Duration);
}

/// Records whether a reveal was requested.
#[derive(Debug, Default)]
pub struct RevealFlag {
    fired: AtomicBool,
}

impl RevealFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl RevealHook for RevealFlag {
    fn reveal(&self, _delay: Duration) {
        self.fired.store(true, Ordering::SeqCst);
    }
}
