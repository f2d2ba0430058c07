use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::warn;

use crate::api_client::ApiError;
use crate::errors::AppError;
use crate::forms::{CvForm, FormErrors};
use crate::render::{render, PageContext};
use crate::session::CurrentSession;
use crate::state::AppState;

pub const SAVE_FAILED: &str = "Failed to save CV";

#[derive(Template)]
#[template(path = "cv_form.html")]
pub struct CvFormTemplate {
    pub ctx: PageContext,
    /// Empty for a new CV.
    pub cv_id: String,
    pub action: String,
    pub form: CvForm,
    pub error: String,
    pub field_errors: Vec<String>,
}

impl CvFormTemplate {
    fn new(ctx: PageContext, cv_id: Option<&str>, form: CvForm) -> Self {
        let action = match cv_id {
            Some(id) => format!("/cvs/{id}"),
            None => "/cvs".to_string(),
        };
        Self {
            ctx,
            cv_id: cv_id.unwrap_or_default().to_string(),
            action,
            form,
            error: String::new(),
            field_errors: Vec::new(),
        }
    }

    fn with_errors(mut self, errors: &FormErrors) -> Self {
        self.error = errors.summary.clone();
        self.field_errors = errors.messages();
        self
    }

    fn with_api_error(mut self, err: &ApiError) -> Self {
        let message = err.user_message();
        self.error = if message.is_empty() {
            SAVE_FAILED.to_string()
        } else {
            format!("{SAVE_FAILED}: {message}")
        };
        self
    }
}

/// GET /cvs/new
pub async fn handle_new(current: CurrentSession) -> Result<Html<String>, AppError> {
    render(&CvFormTemplate::new(
        PageContext::from_session(&current),
        None,
        CvForm::default(),
    ))
}

/// GET /cvs/:id/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let cv = current.api(&state).get_cv(&id).await?;
    render(&CvFormTemplate::new(
        PageContext::from_session(&current),
        Some(&id),
        CvForm::from_cv(&cv),
    ))
}

/// POST /cvs
pub async fn handle_create(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<CvForm>,
) -> Result<Response, AppError> {
    save(&state, &current, None, form).await
}

/// POST /cvs/:id
pub async fn handle_update(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
    Form(form): Form<CvForm>,
) -> Result<Response, AppError> {
    save(&state, &current, Some(&id), form).await
}

/// Validates, then creates or updates. Any failure re-renders the form with
/// what the user typed.
async fn save(
    state: &AppState,
    current: &CurrentSession,
    id: Option<&str>,
    form: CvForm,
) -> Result<Response, AppError> {
    let page = CvFormTemplate::new(PageContext::from_session(current), id, form.clone());

    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return Ok(render(&page.with_errors(&errors))?.into_response()),
    };

    let api = current.api(state);
    let result = match id {
        Some(id) => api.update_cv(id, &payload).await,
        None => api.create_cv(&payload).await,
    };

    match result {
        Ok(_) => Ok(Redirect::to("/cvs").into_response()),
        Err(ApiError::NotFound(msg)) => Err(AppError::NotFound(msg)),
        Err(e) => {
            warn!("Saving CV failed: {e}");
            Ok(render(&page.with_api_error(&e))?.into_response())
        }
    }
}
