// ABOUTME: SSE handler streaming a page session's rendered view as it changes.
// ABOUTME: Watches both the post view state and the summary state and re-renders on either.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use postview_core::{PostViewController, Viewer};
use tokio_stream::wrappers::WatchStream;

use crate::app_state::SharedState;
use crate::sessions::LookupError;

/// Emit a `view` event carrying the rendered [`postview_core::PageView`]
/// whenever the controller's view or summary state changes. The first event
/// is the current view.
fn view_stream(
    controller: Arc<PostViewController>,
    viewer: Viewer,
) -> impl Stream<Item = Result<SseEvent, axum::Error>> {
    let views = WatchStream::new(controller.subscribe()).map(|_| ());
    // The summary watch also yields its current value; skip it so the first
    // snapshot is not sent twice.
    let summaries = WatchStream::from_changes(controller.summaries().subscribe()).map(|_| ());

    stream::select(views, summaries).map(move |()| {
        let view = controller.render(&viewer);
        SseEvent::default().event("view").json_data(&view)
    })
}

/// GET /api/sessions/{sid}/events/stream - SSE endpoint for live view snapshots.
pub async fn event_stream(
    State(state): State<SharedState>,
    Extension(viewer): Extension<Viewer>,
    Path(sid): Path<String>,
) -> impl IntoResponse {
    let controller = match state.sessions.lookup(&sid).await {
        Ok((_, controller)) => controller,
        Err(LookupError::InvalidId) => {
            return (StatusCode::BAD_REQUEST, "invalid session id").into_response();
        }
        Err(LookupError::NotFound) => {
            return (StatusCode::NOT_FOUND, "session not found").into_response();
        }
    };

    Sse::new(view_stream(controller, viewer))
        .keep_alive(KeepAlive::default())
        .into_response()
}
