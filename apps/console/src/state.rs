use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Anonymous client; handlers scope it to the caller's token.
    pub api: ApiClient,
    /// Memory or Redis, chosen at startup from `REDIS_URL`.
    pub sessions: Arc<dyn SessionStore>,
    pub config: Config,
}
