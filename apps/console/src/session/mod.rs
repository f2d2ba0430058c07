//! Browser sessions: the auth token and profile held on behalf of a browser,
//! keyed by an opaque id carried in the `cv_session` cookie.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub mod handlers;
pub mod identity;
pub mod memory;
pub mod redis_store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

pub const SESSION_COOKIE: &str = "cv_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Name shown in the page header.
    pub fn display_name(&self) -> Option<String> {
        match (&self.user, &self.token) {
            (Some(user), _) if !user.full_name.is_empty() => Some(user.full_name.clone()),
            (Some(user), _) => Some(user.email.clone()),
            (None, Some(_)) => Some("Signed in".to_string()),
            (None, None) => None,
        }
    }
}

/// Persistence for sessions. Entries expire after the store's TTL.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError>;
    async fn save(&self, id: Uuid, session: &Session) -> Result<(), SessionError>;
    async fn remove(&self, id: Uuid) -> Result<(), SessionError>;
}

/// Reads the session id from the request cookies, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: Uuid, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}{secure}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extractor resolving the caller's session. Requests without a valid cookie
/// get an empty, anonymous session.
pub struct CurrentSession {
    pub id: Option<Uuid>,
    pub session: Session,
}

impl CurrentSession {
    /// API client authenticated as this session's user.
    pub fn api(&self, state: &AppState) -> ApiClient {
        state.api.with_token(self.session.token.as_deref())
    }

    pub fn display_name(&self) -> Option<String> {
        self.session.display_name()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(id) = session_id_from_headers(&parts.headers) else {
            return Ok(Self {
                id: None,
                session: Session::default(),
            });
        };
        let session = state.sessions.load(id).await?;
        Ok(Self {
            id: session.as_ref().map(|_| id),
            session: session.unwrap_or_default(),
        })
    }
}
