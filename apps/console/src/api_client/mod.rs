/// API Client: the single point of entry for all calls to the remote CV API.
///
/// No view talks HTTP directly; every page goes through this client, scoped to
/// the caller's bearer token with [`ApiClient::with_token`].
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod cv;
pub mod identity;

/// Attempts for idempotent reads. Mutations are sent once.
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// `detail` is set only when the body carried a structured explanation.
    #[error("API error (status {status}): {message}")]
    Status {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Message suitable for showing on a page.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http(_) => "The CV service is unreachable".to_string(),
            ApiError::NotFound(msg) | ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Parse(_) => "The CV service returned an unexpected response".to_string(),
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body);
        let message = extract_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
                detail,
            },
        }
    }
}

/// The backend's own explanation from a JSON error body: FastAPI `detail`
/// (string or validation list) or a `message` field.
fn extract_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body.trim()).ok()?;
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
        Some(serde_json::Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Readable message for any error body: the structured detail, else the raw
/// text.
fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    extract_detail(body).or_else(|| Some(body.to_string()))
}

/// HTTP client bound to the CV API base URL and, optionally, a bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Returns a copy of this client that authenticates with `token`.
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: token.map(str::to_string),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET with retries on 429, 5xx and transport errors.
    /// Backoff doubles from `BACKOFF_BASE_MS`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    "GET {} attempt {} failed, retrying after {}ms...",
                    url,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .authorize(self.client.get(&url))
                .query(query)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ApiError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("CV API returned {} for GET {}: {}", status, url, body);
                last_error = Some(ApiError::from_status(status, &body));
                continue;
            }

            debug!("GET {} -> {}", url, status);
            return decode(response).await;
        }

        Err(last_error.unwrap_or(ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: format!("Gave up after {MAX_ATTEMPTS} attempts"),
            detail: None,
        }))
    }

    /// Sends a mutation once, with an optional JSON body.
    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut request = self.authorize(self.client.request(method.clone(), &url));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        debug!("{} {} -> {}", method, url, response.status());
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}
