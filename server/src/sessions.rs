use std::{collections::HashMap, sync::Arc, time::Duration};

use platform_api::{ApiError, ApiResult};
use products_hr::EditSession;
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug)]
struct Entry {
    session: EditSession,
    touched_at: Instant,
}

impl Entry {
    fn new(session: EditSession) -> Self {
        Self {
            session,
            touched_at: Instant::now(),
        }
    }
}

/// Open org chart edit sessions, keyed by session id. Drafts live only here
/// until they are committed, discarded or left idle longer than the TTL.
#[derive(Clone, Debug)]
pub struct EditSessions {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    limit: usize,
    ttl: Duration,
}

impl EditSessions {
    pub fn new(limit: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            limit,
            ttl,
        }
    }

    /// Idle sessions are evicted before the limit is checked.
    pub async fn open(&self, id: Uuid, session: EditSession) -> ApiResult<()> {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.touched_at.elapsed() <= ttl);
        if sessions.len() < before {
            info!(evicted = before - sessions.len(), "idle edit sessions dropped");
        }
        if sessions.len() >= self.limit {
            return Err(ApiError::LimitExceeded(format!(
                "at most {} org chart edit sessions may be open",
                self.limit
            )));
        }
        sessions.insert(id, Entry::new(session));
        debug!(session_id = %id, open = sessions.len(), "edit session opened");
        Ok(())
    }

    /// Put a session back after a failed commit, regardless of the limit.
    pub async fn restore(&self, id: Uuid, session: EditSession) {
        self.inner.write().await.insert(id, Entry::new(session));
    }

    /// Run `apply` against the session's draft while holding the lock.
    pub async fn update<T>(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut EditSession) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| missing(id))?;
        entry.touched_at = Instant::now();
        apply(&mut entry.session)
    }

    pub async fn close(&self, id: Uuid) -> ApiResult<EditSession> {
        let entry = self.inner.write().await.remove(&id).ok_or_else(|| missing(id))?;
        debug!(session_id = %id, "edit session closed");
        Ok(entry.session)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn missing(id: Uuid) -> ApiError {
    ApiError::not_found(format!("edit session {id} not found"))
}
