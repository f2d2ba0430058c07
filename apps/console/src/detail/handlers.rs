use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, Response},
};

use crate::detail::CvDetail;
use crate::errors::AppError;
use crate::listing::export::{
    csv_filename, cv_json, detail_csv, summary_csv, CSV_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use crate::render::{attachment, render, PageContext};
use crate::session::CurrentSession;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "cv_detail.html")]
pub struct CvDetailTemplate {
    pub ctx: PageContext,
    pub cv: CvDetail,
}

/// GET /cvs/:id
pub async fn handle_detail(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let cv = current.api(&state).get_cv(&id).await?;
    render(&CvDetailTemplate {
        ctx: PageContext::from_session(&current),
        cv: CvDetail::from(&cv),
    })
}

/// GET /cvs/:id/export.csv: every section of the record.
pub async fn handle_export_detail(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let cv = current.api(&state).get_cv(&id).await?;
    Ok(attachment(
        detail_csv(&cv)?,
        CSV_CONTENT_TYPE,
        &csv_filename(&cv.full_name),
    ))
}

/// GET /cvs/:id/summary.csv: the list columns for one record.
pub async fn handle_export_summary(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let cv = current.api(&state).get_cv(&id).await?;
    Ok(attachment(
        summary_csv([&cv])?,
        CSV_CONTENT_TYPE,
        &csv_filename(&cv.full_name),
    ))
}

/// GET /cvs/:id/export.json
pub async fn handle_export_json(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let cv = current.api(&state).get_cv(&id).await?;
    Ok(attachment(cv_json(&cv)?, JSON_CONTENT_TYPE, "cv.json"))
}
