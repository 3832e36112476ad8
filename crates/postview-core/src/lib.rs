// ABOUTME: Core library for postview: the post model and the post-detail view controller.
// ABOUTME: Defines collaborator traits (store, summarizer, sanitizer, page shell) consumed by the controller.

pub mod controller;
pub mod model;
pub mod present;
pub mod sanitize;
pub mod shell;
pub mod store;
pub mod summary;
pub mod view;

pub use controller::{ControllerError, DeleteOutcome, PostViewController, ShareOutcome, ViewState};
pub use model::{Author, Category, Post, Tag};
pub use sanitize::{AmmoniaSanitizer, SanitizePolicy, Sanitizer};
pub use shell::{
    Clipboard, Confirmation, NavTarget, Navigator, Preconfirmed, RecordedNavigation, RevealFlag,
    RevealHook, ShareError, SharePayload, ShareSurface,
};
pub use store::{PostStore, StoreError};
pub use summary::{
    SummarizeError, SummarizerService, Summary, SummaryOrchestrator, SummaryOutcome, SummaryState,
};
pub use view::{ContentView, PageView, Viewer};
