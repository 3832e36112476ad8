// ABOUTME: Viewer resolution middleware for the postview server.
// ABOUTME: Attaches a Viewer extension from a bearer token or cookie and an optional X-User-Id header.

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use postview_core::Viewer;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

pub const TOKEN_COOKIE: &str = "postview_token";
pub const USER_ID_HEADER: &str = "x-user-id";

/// A tower Layer that resolves the current [`Viewer`] for every request.
/// Requests are never rejected here; handlers decide what anonymous viewers
/// may do.
#[derive(Clone)]
pub struct ViewerLayer {
    token: Option<Arc<String>>,
}

impl ViewerLayer {
    /// With `None`, every viewer is anonymous.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::new),
        }
    }
}

impl<S> Layer<S> for ViewerLayer {
    type Service = ViewerMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewerMiddleware {
            inner,
            token: self.token.clone(),
        }
    }
}

/// The middleware service that inserts the resolved viewer into request extensions.
#[derive(Clone)]
pub struct ViewerMiddleware<S> {
    inner: S,
    token: Option<Arc<String>>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
}

/// Work out who is asking from the request headers.
pub fn resolve_viewer(headers: &HeaderMap, token: Option<&str>) -> Viewer {
    let Some(expected) = token else {
        return Viewer::anonymous();
    };

    let presented = bearer_token(headers).or_else(|| cookie_token(headers));
    if presented != Some(expected) {
        return Viewer::anonymous();
    }

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);
    Viewer::authenticated(user_id)
}

impl<S> Service<Request<Body>> for ViewerMiddleware<S>
where
    S: Service<Request<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let viewer = resolve_viewer(req.headers(), self.token.as_deref().map(String::as_str));
        req.extensions_mut().insert(viewer);

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}
