use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::api_client::ApiError;
use crate::render::PageContext;
use crate::session::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so page handlers can return `Result<T, AppError>`;
/// the browser gets an HTML error page with a matching status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("CV API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    ctx: PageContext,
    status: u16,
    title: String,
    message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", msg.clone()),
            AppError::Api(ApiError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", msg.clone())
            }
            AppError::Api(ApiError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "Sign in required", msg.clone())
            }
            AppError::Api(e) => {
                tracing::error!("CV API error: {e}");
                (StatusCode::BAD_GATEWAY, "CV service error", e.user_message())
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Session error",
                    "Your session could not be loaded".to_string(),
                )
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                    "The page could not be rendered".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = self.parts();
        let page = ErrorTemplate {
            ctx: PageContext::anonymous(),
            status: status.as_u16(),
            title: title.to_string(),
            message: message.clone(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}
