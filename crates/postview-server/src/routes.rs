// ABOUTME: Route definitions for the postview HTTP server.
// ABOUTME: Assembles web, API, and health routes with viewer resolution and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::auth::ViewerLayer;
use crate::web;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let viewer_layer = ViewerLayer::new(state.auth_token.clone());

    Router::new()
        .route("/", get(web::index))
        .route("/health", get(health))
        .route("/posts/{id}", get(web::post_page))
        .route("/web/sessions/{sid}", axum::routing::delete(web::unmount))
        .route("/web/sessions/{sid}/view", get(web::session_view))
        .route("/web/sessions/{sid}/summary", post(web::generate_summary))
        .route("/web/sessions/{sid}/delete", post(web::delete_post))
        .route("/web/sessions/{sid}/share", get(web::share))
        .route("/api/posts/{id}", get(api::posts::get_post))
        .route("/api/sessions/{sid}/events/stream", get(api::stream::event_stream))
        .layer(viewer_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use http::Request;
    use postview_agent::testing::FailingSummarizer;
    use postview_core::AmmoniaSanitizer;
    use postview_store::MemoryPostStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        Arc::new(AppState::new(
            Arc::new(MemoryPostStore::new()),
            Arc::new(FailingSummarizer),
            Arc::new(AmmoniaSanitizer),
            None,
            "http://localhost:7340".to_string(),
        ))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_session_stream_is_404() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(
                Request::get(format!("/api/sessions/{}/events/stream", ulid::Ulid::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
}
