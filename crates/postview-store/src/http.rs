// ABOUTME: PostStore client for a remote blog API reached over HTTP.
// ABOUTME: Maps HTTP status codes onto StoreError and imposes a request timeout.

use std::time::Duration;

use async_trait::async_trait;
use postview_core::{Post, PostStore, StoreError};
use reqwest::{StatusCode, Url};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to `{base_url}/posts` and `{base_url}/posts/{id}`. Ids are sent as
/// a single percent-encoded path segment.
pub struct HttpPostStore {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpPostStore {
    /// Create a client for the blog API at `base_url`. `token` is sent as a
    /// bearer token when present.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Transport(format!("invalid API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "API URL {} cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Append path segments to the base URL, encoding each one.
    fn url_with(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Transport(format!("API URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post_url(&self, id: &str) -> Result<Url, StoreError> {
        // Dot segments would be resolved away instead of encoded
        if id.is_empty() || id == "." || id == ".." {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.url_with(&["posts", id])
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Map a non-success status to a store error.
fn status_error(status: StatusCode, id: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(id.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Forbidden,
        other => StoreError::Transport(format!("unexpected status {}", other)),
    }
}

#[async_trait]
impl PostStore for HttpPostStore {
    async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        let response = self
            .authorize(self.client.get(self.post_url(id)?))
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, id));
        }

        response
            .json::<Post>()
            .await
            .map_err(|e| StoreError::Transport(format!("failed to parse post: {}", e)))
    }

    async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .authorize(self.client.delete(self.post_url(id)?))
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, id));
        }
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let url = self.url_with(&["posts"])?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "*"));
        }

        response
            .json::<Vec<Post>>()
            .await
            .map_err(|e| StoreError::Transport(format!("failed to parse posts: {}", e)))
    }
}
