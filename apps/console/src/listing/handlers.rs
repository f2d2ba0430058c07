use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::listing::export::{summary_csv, CSV_CONTENT_TYPE};
use crate::listing::{apply, facets, paginate, ListQuery, SortDirection, SortField};
use crate::render::{attachment, choices, local_path, render, Choice, CvRow, PageContext};
use crate::session::CurrentSession;
use crate::state::AppState;

pub const LOAD_FAILED: &str = "Failed to load CVs";

pub struct SortHeader {
    pub label: &'static str,
    pub href: String,
    pub indicator: &'static str,
}

#[derive(Template)]
#[template(path = "cv_list.html")]
pub struct CvListTemplate {
    pub ctx: PageContext,
    pub error: String,
    pub search: String,
    pub sort: String,
    pub dir: String,
    pub skills: Vec<Choice>,
    pub locations: Vec<Choice>,
    pub headers: Vec<SortHeader>,
    pub rows: Vec<CvRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev_href: String,
    pub next_href: String,
    pub export_href: String,
}

fn href(path: &str, query: &ListQuery) -> String {
    let qs = query.to_query_string();
    if qs.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{qs}")
    }
}

fn list_href(query: &ListQuery) -> String {
    href("/cvs", query)
}

fn sort_headers(query: &ListQuery) -> Vec<SortHeader> {
    SortField::ALL
        .iter()
        .map(|&field| SortHeader {
            label: field.label(),
            href: list_href(&query.toggle_sort(field)),
            indicator: match (query.sort == Some(field), query.dir) {
                (false, _) => "",
                (true, SortDirection::Asc) => "▲",
                (true, SortDirection::Desc) => "▼",
            },
        })
        .collect()
}

/// GET /cvs
pub async fn handle_list(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let (cvs, error) = match current.api(&state).fetch_all_cvs().await {
        Ok(cvs) => (cvs, String::new()),
        Err(e) => {
            warn!("Failed to load CVs: {e}");
            (Vec::new(), LOAD_FAILED.to_string())
        }
    };

    let facets = facets(&cvs);
    let view = apply(&cvs, &query);
    let page = paginate(&view, query.page(), state.config.page_size);

    let prev_href = if page.has_prev() {
        list_href(&query.with_page(page.page - 1))
    } else {
        String::new()
    };
    let next_href = if page.has_next() {
        list_href(&query.with_page(page.page + 1))
    } else {
        String::new()
    };
    let export_query = ListQuery {
        page: None,
        ..query.clone()
    };

    render(&CvListTemplate {
        ctx: PageContext::from_session(&current),
        error,
        search: query.search.clone(),
        sort: query.sort.map(|f| f.as_str().to_string()).unwrap_or_default(),
        dir: match query.dir {
            SortDirection::Asc => "asc".to_string(),
            SortDirection::Desc => "desc".to_string(),
        },
        skills: choices(&facets.skills, &query.skill),
        locations: choices(&facets.locations, &query.location),
        headers: sort_headers(&query),
        rows: page.items.iter().map(|cv| CvRow::from(*cv)).collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
        prev_href,
        next_href,
        export_href: href("/cvs/export.csv", &export_query),
    })
}

/// GET /cvs/export.csv: the filtered, sorted list across all pages.
pub async fn handle_export_list(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let cvs = current.api(&state).fetch_all_cvs().await?;
    let view = apply(&cvs, &query);
    let csv = summary_csv(view.iter().copied())?;
    Ok(attachment(csv, CSV_CONTENT_TYPE, "cvs.csv"))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub return_to: Option<String>,
}

/// POST /cvs/:id/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
    current.api(&state).delete_cv(&id).await?;
    Ok(Redirect::to(&local_path(form.return_to.as_deref(), "/cvs")))
}
