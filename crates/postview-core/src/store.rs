// ABOUTME: The PostStore trait the view controller consumes to fetch and delete posts.
// ABOUTME: Also defines StoreError, the failure taxonomy every store implementation maps into.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::Post;

/// Errors a post store can report.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("not allowed to modify this post")]
    Forbidden,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Backend holding published posts. Implementations are stateless
/// request/response collaborators from the controller's point of view and are
/// responsible for their own timeouts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch a post by id.
    async fn get_post(&self, id: &str) -> Result<Post, StoreError>;

    /// Delete a post by id.
    async fn delete_post(&self, id: &str) -> Result<(), StoreError>;

    /// List posts, newest first. Used by the index page.
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;
}
