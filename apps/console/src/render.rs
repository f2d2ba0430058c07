//! Shared page plumbing: header context and template rendering.

use askama::Template;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, NaiveDateTime};

use crate::errors::AppError;
use crate::models::cv::Cv;
use crate::session::CurrentSession;

/// Values every page's header needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub signed_in: bool,
    pub user_name: String,
}

impl PageContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_session(current: &CurrentSession) -> Self {
        Self {
            signed_in: current.session.is_authenticated(),
            user_name: current.display_name().unwrap_or_default(),
        }
    }
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

/// Serves `body` as a file download.
pub fn attachment(body: String, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// One CV in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CvRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub location: String,
    pub phone: String,
    pub skills: String,
    pub created: String,
}

impl From<&Cv> for CvRow {
    fn from(cv: &Cv) -> Self {
        Self {
            id: cv.id.clone(),
            full_name: cv.full_name.clone(),
            email: cv.email.clone(),
            location: cv.location.clone().unwrap_or_default(),
            phone: cv.phone.clone().unwrap_or_default(),
            skills: cv.skills.join(", "),
            created: cv.created_at.as_deref().map(format_timestamp).unwrap_or_default(),
        }
    }
}

/// An `<option>` in a filter dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub value: String,
    pub selected: bool,
}

pub fn choices(values: &[String], current: &str) -> Vec<Choice> {
    values
        .iter()
        .map(|v| Choice {
            value: v.clone(),
            selected: v == current,
        })
        .collect()
}

/// `YYYY-MM-DD HH:MM` for the API's ISO timestamps (with or without offset);
/// anything unparseable is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M";
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(DISPLAY).to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.format(DISPLAY).to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Redirect target from a form, restricted to local paths. Browsers read a
/// leading `//` or `/\` as another host.
pub fn local_path(target: Option<&str>, fallback: &'static str) -> String {
    match target {
        Some(t) if is_local(t) => t.to_string(),
        _ => fallback.to_string(),
    }
}

fn is_local(target: &str) -> bool {
    let mut chars = target.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !target.chars().any(char::is_control)
}

/// Horizontal bar width for a chart row, as a CSS percentage.
pub fn bar_width(count: u64, max: u64) -> String {
    if max == 0 {
        return "0%".to_string();
    }
    let pct = (count as f64 / max as f64) * 100.0;
    format!("{}%", (pct * 100.0).round() / 100.0)
}

pub fn max_count(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().max().unwrap_or(0)
}
