// ABOUTME: Maps controller state to one of three mutually exclusive page views.
// ABOUTME: Every piece of external HTML passes through the sanitizer gate here before it reaches a template.

use serde::Serialize;

use crate::controller::{NOT_FOUND_MESSAGE, ViewState};
use crate::present::{
    author_name, edit_href, format_date, initials, reading_time_label,
};
use crate::sanitize::{Sanitizer, sanitize_for_render};
use crate::shell::NavTarget;
use crate::summary::SummaryState;

/// Who is looking at the page, as supplied by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: Option<String>) -> Self {
        Self {
            authenticated: true,
            user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub message: String,
    pub home_href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    /// Edit and delete are only offered to authenticated viewers.
    pub can_manage: bool,
    pub edit_href: String,
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPanel {
    pub loading: bool,
    /// Sanitized summary HTML, absent until the first generation completes.
    pub html: Option<String>,
    pub failed: bool,
}

impl SummaryPanel {
    pub fn from_state(state: &SummaryState, sanitizer: &dyn Sanitizer) -> Self {
        Self {
            loading: state.loading_summary,
            html: state
                .summary
                .as_ref()
                .map(|s| sanitize_for_render(sanitizer, s.html())),
            failed: state.summary.as_ref().is_some_and(|s| s.is_failure()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub post_id: String,
    pub title: String,
    pub author_name: String,
    pub author_initials: String,
    pub date_label: String,
    pub reading_label: String,
    /// Sanitized article body.
    pub content_html: String,
    pub category: String,
    pub tags: Vec<String>,
    pub back_href: String,
    pub controls: Controls,
    /// Set after a failed delete; the post stays on screen.
    pub error: Option<String>,
    pub summary: SummaryPanel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageView {
    Loading,
    Error(ErrorPanel),
    Content(Box<ContentView>),
}

impl PageView {
    /// Pick the view for the current state: loading skeleton while loading,
    /// error panel when no post is present, content otherwise.
    pub fn build(
        view: &ViewState,
        summary: &SummaryState,
        viewer: &Viewer,
        sanitizer: &dyn Sanitizer,
    ) -> Self {
        if view.loading {
            return PageView::Loading;
        }

        let Some(post) = &view.post else {
            return PageView::Error(ErrorPanel {
                message: view
                    .error
                    .clone()
                    .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string()),
                home_href: NavTarget::Home.href(),
            });
        };

        let author = author_name(post);
        PageView::Content(Box::new(ContentView {
            post_id: post.id.clone(),
            title: post.title.clone(),
            author_initials: initials(&author),
            author_name: author,
            date_label: format_date(&post.created_at),
            reading_label: reading_time_label(post.reading_time),
            content_html: sanitize_for_render(sanitizer, &post.content),
            category: post.category.name.clone(),
            tags: post.tags.iter().map(|t| t.name.clone()).collect(),
            back_href: NavTarget::Home.href(),
            controls: Controls {
                can_manage: viewer.authenticated,
                edit_href: edit_href(&post.id),
                deleting: view.is_deleting,
            },
            error: view.error.clone(),
            summary: SummaryPanel::from_state(summary, sanitizer),
        }))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageView::Loading)
    }
}
