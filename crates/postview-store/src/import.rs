// ABOUTME: Seeds a SQLite post store from a JSON file containing an array of posts.
// ABOUTME: Used by the `postview import` subcommand.

use std::path::Path;

use postview_core::{Post, StoreError};
use thiserror::Error;

use crate::sqlite::SqlitePostStore;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid post data in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("post {id} has an empty title")]
    Invalid { id: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Parse a JSON array of posts. Each post must carry a non-empty id and title.
pub fn parse_posts(raw: &str, path: &str) -> Result<Vec<Post>, ImportError> {
    let posts: Vec<Post> = serde_json::from_str(raw).map_err(|source| ImportError::Parse {
        path: path.to_string(),
        source,
    })?;

    for post in &posts {
        if post.id.trim().is_empty() || post.title.trim().is_empty() {
            return Err(ImportError::Invalid {
                id: post.id.clone(),
            });
        }
    }
    Ok(posts)
}

/// Load every post in `path` into `store`, replacing posts with the same id.
/// Returns the number of posts written.
pub async fn import_posts(store: &SqlitePostStore, path: &Path) -> Result<usize, ImportError> {
    let shown = path.display().to_string();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Read {
            path: shown.clone(),
            source,
        })?;

    let posts = parse_posts(&raw, &shown)?;
    let count = posts.len();
    for post in posts {
        tracing::debug!(post_id = %post.id, "importing post");
        store.upsert_post(post).await?;
    }

    tracing::info!(count, path = %shown, "imported posts");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqlitePosts;
    use postview_core::PostStore;

    const POSTS: &str = r#"[
        {
            "id": "p1",
            "title": "First",
            "content": "<p>one</p>",
            "createdAt": "2025-01-01T00:00:00Z",
            "readingTime": 1,
            "category": { "id": "c1", "name": "General" },
            "tags": [{ "id": "t1", "name": "intro" }]
        },
        {
            "id": "p2",
            "title": "Second",
            "content": "<p>two</p>",
            "createdAt": "2025-02-01T00:00:00Z",
            "readingTime": 3,
            "author": { "name": "Ada" },
            "category": { "id": "c1", "name": "General" }
        }
    ]"#;

    #[tokio::test]
    async fn imports_posts_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("posts.json");
        std::fs::write(&file, POSTS).unwrap();

        let store = SqlitePostStore::new(SqlitePosts::open_in_memory().unwrap());
        let count = import_posts(&store, &file).await.unwrap();
        assert_eq!(count, 2);

        let first = store.get_post("p1").await.unwrap();
        assert_eq!(first.tags[0].name, "intro");
        let second = store.get_post("p2").await.unwrap();
        assert_eq!(second.author.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqlitePostStore::new(SqlitePosts::open_in_memory().unwrap());

        let err = import_posts(&store, &dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_posts("{\"id\": 1}", "inline").unwrap_err();
        assert!(matches!(err, ImportError::Parse { .. }));
    }

    #[test]
    fn rejects_untitled_posts() {
        let raw = r#"[{"id":"p9","title":"  ","content":"","createdAt":"","readingTime":0,
            "category":{"id":"c","name":"c"}}]"#;
        let err = parse_posts(raw, "inline").unwrap_err();
        assert!(matches!(err, ImportError::Invalid { ref id } if id == "p9"));
    }
}
