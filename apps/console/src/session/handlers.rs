use askama::Template;
use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::render::{render, PageContext};
use crate::session::identity;
use crate::session::{clear_session_cookie, session_cookie, CurrentSession};
use crate::state::AppState;

const REGISTERED_NOTICE: &str = "Registration successful. Please sign in.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub error: String,
    pub notice: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub full_name: String,
    pub email: String,
    pub error: String,
}

/// GET /login
pub async fn handle_login_page(
    current: CurrentSession,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    let notice = if query.registered.is_some() {
        REGISTERED_NOTICE.to_string()
    } else {
        String::new()
    };
    render(&LoginTemplate {
        ctx: PageContext::from_session(&current),
        email: String::new(),
        error: String::new(),
        notice,
    })
}

/// POST /login
///
/// On success the session is stored under a fresh id and the browser is sent
/// to the CV list with the new cookie. Any previous session is dropped.
pub async fn handle_login(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let session = match identity::login(&state.api, &form.email, &form.password).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Sign-in failed for {}: {e}", form.email.trim());
            let page = render(&LoginTemplate {
                ctx: PageContext::from_session(&current),
                email: form.email.clone(),
                error: e.to_string(),
                notice: String::new(),
            })?;
            return Ok(page.into_response());
        }
    };

    if let Some(old) = current.id {
        state.sessions.remove(old).await?;
    }
    let id = Uuid::new_v4();
    state.sessions.save(id, &session).await?;

    let cookie = session_cookie(
        id,
        state.config.session_ttl.as_secs(),
        state.config.cookie_secure,
    );
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/cvs")).into_response())
}

/// GET /register
pub async fn handle_register_page(current: CurrentSession) -> Result<Html<String>, AppError> {
    render(&RegisterTemplate {
        ctx: PageContext::from_session(&current),
        full_name: String::new(),
        email: String::new(),
        error: String::new(),
    })
}

/// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<RegisterRequest>,
) -> Result<Response, AppError> {
    match identity::register(&state.api, &form).await {
        Ok(_) => Ok(Redirect::to("/login?registered=1").into_response()),
        Err(e) => {
            let page = render(&RegisterTemplate {
                ctx: PageContext::from_session(&current),
                full_name: form.full_name,
                email: form.email,
                error: e.to_string(),
            })?;
            Ok(page.into_response())
        }
    }
}

/// POST /logout
pub async fn handle_logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, AppError> {
    if let Some(id) = current.id {
        state.sessions.remove(id).await?;
        info!("Session {id} signed out");
    }
    Ok(([(SET_COOKIE, clear_session_cookie())], Redirect::to("/login")).into_response())
}
