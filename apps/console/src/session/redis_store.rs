use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client as RedisClient, Cmd};
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

const KEY_PREFIX: &str = "cv-console:session:";

/// Session store backed by Redis; expiry is delegated to `SET ... EX`.
///
/// One multiplexed connection is shared by every request and re-established
/// by the manager when it drops.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn connect(client: RedisClient, ttl: Duration) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl })
    }

    fn key(id: Uuid) -> String {
        format!("{KEY_PREFIX}{id}")
    }

    fn set_cmd(&self, id: Uuid, raw: String) -> Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(Self::key(id))
            .arg(raw)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1));
        cmd
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: Uuid, session: &Session) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(session)?;
        let () = self.set_cmd(id, raw).query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
