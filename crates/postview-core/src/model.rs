// ABOUTME: Defines the Post entity and its author, category, and tag records.
// ABOUTME: Field names follow the blog API's camelCase JSON so posts deserialize as-is.

use serde::{Deserialize, Serialize};

/// The author of a post. Only the display name is exposed by the blog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// The single category a post is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A tag attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// A published article.
///
/// `content` is untrusted HTML straight from the store. It must only reach a
/// rendered page through the sanitizer gate in [`crate::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    /// ISO-8601 timestamp as delivered by the store.
    pub created_at: String,
    pub reading_time: u32,
    #[serde(default)]
    pub author: Option<Author>,
    pub category: Category,
    /// Display order is storage order.
    #[serde(default)]
    pub tags: Vec<Tag>,
}
