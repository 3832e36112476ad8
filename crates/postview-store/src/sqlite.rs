// ABOUTME: SQLite-backed post storage used when postview serves its own posts.
// ABOUTME: Provides upsert, fetch, delete, and list over posts, tags, and ordered post-tag links.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postview_core::{Author, Category, Post, PostStore, StoreError, Tag};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Errors that can occur during SQLite post operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("post not found: {0}")]
    NotFound(String),
}

impl From<SqliteError> for StoreError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::NotFound(id) => StoreError::NotFound(id),
            SqliteError::Sqlite(e) => StoreError::Storage(e.to_string()),
            SqliteError::Io(e) => StoreError::Storage(e.to_string()),
        }
    }
}

/// Synchronous access to the posts database.
pub struct SqlitePosts {
    conn: Connection,
}

impl SqlitePosts {
    /// Open or create a posts database at the given path.
    /// Runs migrations to ensure the schema is up to date.
    pub fn open(path: &Path) -> Result<Self, SqliteError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SqliteError> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS posts (
                post_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                reading_time INTEGER NOT NULL,
                author_name TEXT,
                category_id TEXT NOT NULL,
                category_name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                tag_id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS post_tags (
                post_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (post_id, tag_id),
                FOREIGN KEY (post_id) REFERENCES posts(post_id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(tag_id)
            );",
        )?;

        Ok(Self { conn })
    }

    /// Insert or replace a post and its tag links. Tag order is preserved.
    pub fn upsert_post(&mut self, post: &Post) -> Result<(), SqliteError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO posts (post_id, title, content, created_at, reading_time, author_name, category_id, category_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(post_id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                created_at = excluded.created_at,
                reading_time = excluded.reading_time,
                author_name = excluded.author_name,
                category_id = excluded.category_id,
                category_name = excluded.category_name",
            params![
                post.id,
                post.title,
                post.content,
                post.created_at,
                post.reading_time,
                post.author.as_ref().map(|a| a.name.as_str()),
                post.category.id,
                post.category.name,
            ],
        )?;

        tx.execute("DELETE FROM post_tags WHERE post_id = ?1", params![post.id])?;

        for (position, tag) in post.tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO tags (tag_id, name) VALUES (?1, ?2)
                 ON CONFLICT(tag_id) DO UPDATE SET name = excluded.name",
                params![tag.id, tag.name],
            )?;
            tx.execute(
                "INSERT INTO post_tags (post_id, tag_id, position) VALUES (?1, ?2, ?3)",
                params![post.id, tag.id, position as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Fetch a post by id.
    pub fn get_post(&self, id: &str) -> Result<Post, SqliteError> {
        let row = self
            .conn
            .query_row(
                "SELECT post_id, title, content, created_at, reading_time, author_name, category_id, category_name
                 FROM posts WHERE post_id = ?1",
                params![id],
                post_from_row,
            )
            .optional()?;

        let mut post = row.ok_or_else(|| SqliteError::NotFound(id.to_string()))?;
        post.tags = self.tags_for(&post.id)?;
        Ok(post)
    }

    /// Delete a post by id. Its tag links go with it.
    pub fn delete_post(&self, id: &str) -> Result<(), SqliteError> {
        let removed = self
            .conn
            .execute("DELETE FROM posts WHERE post_id = ?1", params![id])?;
        if removed == 0 {
            return Err(SqliteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// List all posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<Post>, SqliteError> {
        let mut stmt = self.conn.prepare(
            "SELECT post_id, title, content, created_at, reading_time, author_name, category_id, category_name
             FROM posts ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], post_from_row)?;

        let mut posts = Vec::new();
        for row in rows {
            let mut post = row?;
            post.tags = self.tags_for(&post.id)?;
            posts.push(post);
        }
        Ok(posts)
    }

    fn tags_for(&self, post_id: &str) -> Result<Vec<Tag>, SqliteError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.tag_id, t.name FROM post_tags pt
             JOIN tags t ON t.tag_id = pt.tag_id
             WHERE pt.post_id = ?1 ORDER BY pt.position ASC",
        )?;

        let rows = stmt.query_map(params![post_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let author_name: Option<String> = row.get(5)?;
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        reading_time: row.get(4)?,
        author: author_name.map(|name| Author { name }),
        category: Category {
            id: row.get(6)?,
            name: row.get(7)?,
        },
        tags: Vec::new(),
    })
}

/// [`PostStore`] over a shared [`SqlitePosts`]. Queries run on the blocking
/// thread pool.
#[derive(Clone)]
pub struct SqlitePostStore {
    db: Arc<Mutex<SqlitePosts>>,
}

impl SqlitePostStore {
    pub fn open(path: &Path) -> Result<Self, SqliteError> {
        Ok(Self::new(SqlitePosts::open(path)?))
    }

    pub fn new(db: SqlitePosts) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Insert or replace a post.
    pub async fn upsert_post(&self, post: Post) -> Result<(), StoreError> {
        self.with_db(move |db| db.upsert_post(&post)).await
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqlitePosts) -> Result<T, SqliteError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| StoreError::Storage("posts database lock poisoned".to_string()))?;
            f(&mut *guard).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Storage(format!("blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        let id = id.to_string();
        self.with_db(move |db| db.get_post(&id)).await
    }

    async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_db(move |db| db.delete_post(&id)).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        self.with_db(|db| db.list_posts()).await
    }
}
