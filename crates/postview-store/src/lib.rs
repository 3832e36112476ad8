// ABOUTME: Post persistence backends for postview.
// ABOUTME: SQLite for local use, an HTTP client for a remote blog API, and an in-memory map for tests.

pub mod http;
pub mod import;
pub mod memory;
pub mod sqlite;

pub use http::HttpPostStore;
pub use import::{ImportError, import_posts};
pub use memory::MemoryPostStore;
pub use sqlite::{SqliteError, SqlitePostStore, SqlitePosts};
