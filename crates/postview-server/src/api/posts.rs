// ABOUTME: Post lookup API returning a post with its body already sanitized.
// ABOUTME: Store errors map to 404, 403, or 502 with a JSON error body.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use postview_core::StoreError;
use postview_core::sanitize::sanitize_for_render;

use crate::app_state::SharedState;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// GET /api/posts/{id} - Fetch one post. `content` is safe to embed as HTML.
pub async fn get_post(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.store.get_post(&id).await {
        Ok(mut post) => {
            post.content = sanitize_for_render(state.sanitizer.as_ref(), &post.content);
            Json(post).into_response()
        }
        Err(StoreError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "post not found"),
        Err(StoreError::Forbidden) => error_response(StatusCode::FORBIDDEN, "forbidden"),
        Err(e) => {
            tracing::error!(post_id = %id, error = %e, "failed to fetch post");
            error_response(StatusCode::BAD_GATEWAY, "failed to fetch post")
        }
    }
}
