// ABOUTME: Registry of mounted post-page sessions, one controller per open page.
// ABOUTME: Sessions are keyed by monotonic ULIDs so eviction drops the oldest first.

use std::collections::BTreeMap;
use std::sync::Arc;

use postview_core::PostViewController;
use thiserror::Error;
use tokio::sync::RwLock;
use ulid::{Generator, Ulid};

pub const DEFAULT_SESSION_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("invalid session id")]
    InvalidId,

    #[error("session not found")]
    NotFound,
}

struct Inner {
    generator: Generator,
    sessions: BTreeMap<Ulid, Arc<PostViewController>>,
}

/// Bounded map of live page sessions. Mounting past capacity unmounts the
/// oldest session.
pub struct SessionRegistry {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                generator: Generator::new(),
                sessions: BTreeMap::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Register a controller and return its session id.
    pub async fn mount(&self, controller: Arc<PostViewController>) -> Ulid {
        let mut inner = self.inner.write().await;
        // Overflow only happens after 2^80 ids in one millisecond
        let id = inner.generator.generate().unwrap_or_else(|_| Ulid::new());
        inner.sessions.insert(id, controller);

        while inner.sessions.len() > self.capacity {
            if let Some((evicted, _)) = inner.sessions.pop_first() {
                tracing::debug!(session_id = %evicted, "evicting oldest page session");
            }
        }
        id
    }

    pub async fn get(&self, id: &Ulid) -> Option<Arc<PostViewController>> {
        self.inner.read().await.sessions.get(id).cloned()
    }

    /// Parse a session id from a path segment and fetch its controller.
    pub async fn lookup(&self, raw: &str) -> Result<(Ulid, Arc<PostViewController>), LookupError> {
        let id = raw.parse::<Ulid>().map_err(|_| LookupError::InvalidId)?;
        let controller = self.get(&id).await.ok_or(LookupError::NotFound)?;
        Ok((id, controller))
    }

    /// Drop a session. Returns whether it existed.
    pub async fn unmount(&self, id: &Ulid) -> bool {
        self.inner.write().await.sessions.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}
