use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

/// In-process session store. Expired entries are dropped lazily on access
/// and swept on every save.
pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, (Session, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        let mut entries = self.entries.write().await;
        match entries.get(&id) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(&id);
                Ok(None)
            }
            Some((session, _)) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn save(&self, id: Uuid, session: &Session) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(id, (session.clone(), now + self.ttl));
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.entries.write().await.remove(&id);
        Ok(())
    }
}
