// ABOUTME: Web UI route handlers serving HTML via Askama templates and HTMX.
// ABOUTME: Mounts one controller session per post page and renders its skeleton, error, or content view.

use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use postview_core::controller::DELETE_PROMPT;
use postview_core::present::{author_name, format_date, reading_time_label, view_href};
use postview_core::shell::REVEAL_DELAY;
use postview_core::view::{ErrorPanel, SummaryPanel};
use postview_core::{
    ContentView, ControllerError, DeleteOutcome, NavTarget, PageView, Preconfirmed,
    RecordedNavigation, RevealFlag, SharePayload, Viewer,
};
use serde::{Deserialize, Serialize};

use crate::app_state::SharedState;
use crate::sessions::LookupError;

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;

fn error_fragment(status: StatusCode, message: &str) -> Response {
    (
        status,
        Html(format!("<p class=\"error-msg\">{}</p>", message)),
    )
        .into_response()
}

fn lookup_error_response(err: LookupError) -> Response {
    match err {
        LookupError::InvalidId => error_fragment(StatusCode::BAD_REQUEST, "Invalid session ID."),
        LookupError::NotFound => error_fragment(
            StatusCode::NOT_FOUND,
            "This page has expired. Please reload.",
        ),
    }
}

/// One row of the post list.
#[derive(Debug, Clone)]
pub struct PostListItem {
    pub href: String,
    pub title: String,
    pub author_name: String,
    pub date_label: String,
    pub reading_label: String,
    pub category: String,
}

/// Index page listing every post in the store.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub posts: Vec<PostListItem>,
    pub error: Option<String>,
}

/// GET / - Render the post list.
pub async fn index(State(state): State<SharedState>) -> IndexTemplate {
    match state.store.list_posts().await {
        Ok(posts) => IndexTemplate {
            posts: posts
                .iter()
                .map(|post| PostListItem {
                    href: view_href(&post.id),
                    title: post.title.clone(),
                    author_name: author_name(post),
                    date_label: format_date(&post.created_at),
                    reading_label: reading_time_label(post.reading_time),
                    category: post.category.name.clone(),
                })
                .collect(),
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to list posts");
            IndexTemplate {
                posts: vec![],
                error: Some("Failed to load posts. Please try again later.".to_string()),
            }
        }
    }
}

/// Page shell for one post. The body starts as the loading skeleton and
/// fetches the settled view over htmx.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "post.html")]
pub struct PostPageTemplate {
    pub session_id: String,
}

/// GET /posts/{id} - Mount a page session and start loading the post.
pub async fn post_page(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let controller = Arc::new(state.new_controller());
    let session_id = state.sessions.mount(Arc::clone(&controller)).await;
    tracing::debug!(session_id = %session_id, post_id = %id, "mounted post page");

    tokio::spawn(async move {
        // Outcomes land in the controller's state; errors are already logged.
        let _ = controller.load(Some(&id)).await;
    });

    PostPageTemplate {
        session_id: session_id.to_string(),
    }
    .into_response()
}

/// Partial: loading skeleton.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "partials/loading.html")]
pub struct LoadingTemplate {}

/// Partial: error panel shown when no post is present.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "partials/error.html")]
pub struct ErrorTemplate {
    pub panel: ErrorPanel,
}

/// Partial: the loaded post with controls and the summary panel.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "partials/content.html")]
pub struct ContentTemplate {
    pub session_id: String,
    pub content: ContentView,
    pub summary: SummaryPanel,
    pub delete_prompt: &'static str,
    pub reveal: bool,
    pub reveal_delay_ms: u128,
}

/// Partial: the summary panel, returned on its own after generation.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "partials/summary.html")]
pub struct SummaryTemplate {
    pub session_id: String,
    pub summary: SummaryPanel,
    pub reveal: bool,
    pub reveal_delay_ms: u128,
}

/// Render exactly one of skeleton, error panel, or content.
fn render_page_view(view: PageView, session_id: &str) -> Response {
    match view {
        PageView::Loading => LoadingTemplate {}.into_response(),
        PageView::Error(panel) => ErrorTemplate { panel }.into_response(),
        PageView::Content(content) => {
            let summary = content.summary.clone();
            ContentTemplate {
                session_id: session_id.to_string(),
                content: *content,
                summary,
                delete_prompt: DELETE_PROMPT,
                reveal: false,
                reveal_delay_ms: REVEAL_DELAY.as_millis(),
            }
            .into_response()
        }
    }
}

/// GET /web/sessions/{sid}/view - Wait for the load to settle and render the view.
pub async fn session_view(
    State(state): State<SharedState>,
    Extension(viewer): Extension<Viewer>,
    Path(sid): Path<String>,
) -> Response {
    let controller = match state.sessions.lookup(&sid).await {
        Ok((_, controller)) => controller,
        Err(e) => return lookup_error_response(e),
    };

    controller.settled().await;
    render_page_view(controller.render(&viewer), &sid)
}

/// POST /web/sessions/{sid}/summary - Generate a summary and return the panel.
pub async fn generate_summary(
    State(state): State<SharedState>,
    Path(sid): Path<String>,
) -> Response {
    let controller = match state.sessions.lookup(&sid).await {
        Ok((_, controller)) => controller,
        Err(e) => return lookup_error_response(e),
    };

    let reveal = RevealFlag::new();
    let outcome = controller.generate_summary(&reveal).await;
    tracing::debug!(session_id = %sid, ?outcome, "summary request finished");

    SummaryTemplate {
        session_id: sid,
        summary: SummaryPanel::from_state(&controller.summary_state(), state.sanitizer.as_ref()),
        reveal: reveal.fired(),
        reveal_delay_ms: REVEAL_DELAY.as_millis(),
    }
    .into_response()
}

/// Form data for deleting the post. The browser's confirm dialog sets
/// `confirmed`.
#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirmed: bool,
}

/// POST /web/sessions/{sid}/delete - Delete the post, then redirect home.
pub async fn delete_post(
    State(state): State<SharedState>,
    Extension(viewer): Extension<Viewer>,
    Path(sid): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let (session_id, controller) = match state.sessions.lookup(&sid).await {
        Ok(found) => found,
        Err(e) => return lookup_error_response(e),
    };

    if !viewer.authenticated {
        return error_fragment(StatusCode::FORBIDDEN, "You must be signed in to delete posts.");
    }

    let navigator = RecordedNavigation::new();
    match controller
        .delete(&Preconfirmed(form.confirmed), &navigator)
        .await
    {
        Ok(DeleteOutcome::Deleted) => {
            state.sessions.unmount(&session_id).await;
            let target = navigator.last().unwrap_or(NavTarget::Home).href();
            (StatusCode::OK, [("HX-Redirect", target)]).into_response()
        }
        Ok(DeleteOutcome::Cancelled | DeleteOutcome::Failed) => {
            render_page_view(controller.render(&viewer), &sid)
        }
        Err(ControllerError::NoPost) => {
            error_fragment(StatusCode::CONFLICT, "There is no post to delete.")
        }
        Err(ControllerError::DeleteInProgress) => {
            error_fragment(StatusCode::CONFLICT, "A delete is already in progress.")
        }
        Err(e) => {
            tracing::error!(session_id = %sid, error = %e, "unexpected delete failure");
            error_fragment(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete the post. Please try again later.",
            )
        }
    }
}

/// What the page's share button needs: a native share payload when a post is
/// loaded, and the page URL to copy when sharing is unavailable.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub payload: Option<SharePayload>,
    pub url: String,
}

/// GET /web/sessions/{sid}/share - Share payload for the browser share API.
pub async fn share(State(state): State<SharedState>, Path(sid): Path<String>) -> Response {
    let controller = match state.sessions.lookup(&sid).await {
        Ok((_, controller)) => controller,
        Err(e) => return lookup_error_response(e),
    };

    let url = match controller.state().post_id {
        Some(post_id) => state.page_url(&post_id),
        None => format!("{}{}", state.public_base_url, NavTarget::Home.href()),
    };

    Json(ShareResponse {
        payload: controller.share_payload(&url),
        url,
    })
    .into_response()
}

/// DELETE /web/sessions/{sid} - Unmount a page session.
pub async fn unmount(State(state): State<SharedState>, Path(sid): Path<String>) -> StatusCode {
    let Ok(id) = sid.parse::<ulid::Ulid>() else {
        return StatusCode::BAD_REQUEST;
    };
    if state.sessions.unmount(&id).await {
        tracing::debug!(session_id = %id, "unmounted post page");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
