//! Authentication endpoints: login, registration, profile and user listing.

use reqwest::Method;

use super::{decode, ApiClient, ApiError};
use crate::models::user::{RegisterRequest, TokenResponse, User};

impl ApiClient {
    /// POST /login. The backend expects an OAuth2 password form where the
    /// email travels as `username`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url("login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        decode(response).await
    }

    /// POST /register
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.send_json(Method::POST, "register", Some(request)).await
    }

    /// GET /me for the token this client carries.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("me", &[]).await
    }

    /// GET /users
    pub async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<User>, ApiError> {
        self.get_json(
            "users",
            &[("skip", skip.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}
