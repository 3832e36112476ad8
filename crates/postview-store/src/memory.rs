// ABOUTME: In-memory PostStore backed by a BTreeMap, used for tests and demo servers.
// ABOUTME: Counts get/delete calls and can be told to fail deletes so callers can observe side effects.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use postview_core::{Post, PostStore, StoreError};

#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<BTreeMap<String, Post>>,
    gets: AtomicUsize,
    deletes: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let store = Self::new();
        for post in posts {
            store.insert(post);
        }
        store
    }

    /// Insert or replace a post. A poisoned lock is recovered since the map
    /// holds no invariants beyond its entries.
    pub fn insert(&self, post: Post) {
        let mut posts = self.posts.write().unwrap_or_else(|e| e.into_inner());
        posts.insert(post.id.clone(), post);
    }

    pub fn contains(&self, id: &str) -> bool {
        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        posts.contains_key(id)
    }

    /// Make every subsequent delete fail with a transport error.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        posts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("delete rejected".to_string()));
        }
        let mut posts = self.posts.write().unwrap_or_else(|e| e.into_inner());
        posts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<Post> = posts.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}
