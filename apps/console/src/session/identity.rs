use thiserror::Error;
use tracing::{info, warn};

use super::Session;
use crate::api_client::{ApiClient, ApiError};
use crate::models::user::{RegisterRequest, User};

pub const MISSING_FIELDS: &str = "Please fill in all fields";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("{}", MISSING_FIELDS)]
    MissingFields,

    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials(#[source] ApiError),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("{}", MISSING_FIELDS)]
    MissingFields,

    /// Carries the backend's explanation, e.g. "Email already registered".
    #[error("{0}")]
    Rejected(String),
}

/// Exchanges credentials for a token, then loads the profile.
/// A failed profile fetch still yields a signed-in session.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<Session, LoginError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(LoginError::MissingFields);
    }

    let token = api
        .login(email, password)
        .await
        .map_err(LoginError::InvalidCredentials)?;

    let user = match api.with_token(Some(&token.access_token)).me().await {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Signed in {email} but could not load profile: {e}");
            None
        }
    };

    info!("User {email} signed in");
    Ok(Session {
        token: Some(token.access_token),
        user,
    })
}

pub async fn register(api: &ApiClient, request: &RegisterRequest) -> Result<User, RegisterError> {
    if request.full_name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(RegisterError::MissingFields);
    }

    let request = RegisterRequest {
        full_name: request.full_name.trim().to_string(),
        email: request.email.trim().to_string(),
        password: request.password.clone(),
    };

    match api.register(&request).await {
        Ok(user) => {
            info!("Registered user {}", user.email);
            Ok(user)
        }
        Err(ApiError::Status {
            detail: Some(detail),
            ..
        }) if !detail.trim().is_empty() => Err(RegisterError::Rejected(detail)),
        Err(e) => {
            warn!("Registration for {} failed: {e}", request.email);
            Err(RegisterError::Rejected(REGISTRATION_FAILED.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api/v1", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let server = MockServer::start().await;
        let err = login(&client_for(&server), "  ", "pw").await.unwrap_err();
        assert!(matches!(err, LoginError::MissingFields));
        assert_eq!(err.to_string(), MISSING_FIELDS);
    }

    #[tokio::test]
    async fn test_login_keeps_token_when_profile_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-1", "token_type": "bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "User not found"})),
            )
            .mount(&server)
            .await;

        let session = login(&client_for(&server), "ana@cv.io", "pw").await.unwrap();
        assert_eq!(session.token.as_deref(), Some("jwt-1"));
        assert!(session.user.is_none());
    }

    #[tokio::test]
    async fn test_login_with_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-2", "token_type": "bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u9", "full_name": "Ana", "email": "ana@cv.io", "role": "recruiter"
            })))
            .mount(&server)
            .await;

        let session = login(&client_for(&server), "ana@cv.io", "pw").await.unwrap();
        assert_eq!(session.user.unwrap().id, "u9");
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let err = login(&client_for(&server), "ana@cv.io", "bad").await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_register_surfaces_backend_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "Email already registered"
            })))
            .mount(&server)
            .await;

        let request = RegisterRequest {
            full_name: "Ana".to_string(),
            email: "ana@cv.io".to_string(),
            password: "pw".to_string(),
        };
        let err = register(&client_for(&server), &request).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn test_register_falls_back_without_backend_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let request = RegisterRequest {
            full_name: "Ana".to_string(),
            email: "ana@cv.io".to_string(),
            password: "pw".to_string(),
        };
        let err = register(&client_for(&server), &request).await.unwrap_err();
        assert_eq!(err.to_string(), REGISTRATION_FAILED);
    }

    #[tokio::test]
    async fn test_register_hides_html_error_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let request = RegisterRequest {
            full_name: "Ana".to_string(),
            email: "ana@cv.io".to_string(),
            password: "pw".to_string(),
        };
        let err = register(&client_for(&server), &request).await.unwrap_err();
        assert_eq!(err.to_string(), REGISTRATION_FAILED);
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let server = MockServer::start().await;
        let err = register(&client_for(&server), &RegisterRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::MissingFields));
    }
}
