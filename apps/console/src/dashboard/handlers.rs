use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api_client::ApiError;
use crate::dashboard::{education_bars, location_bars, skill_bars, Bar, ExperienceSummary};
use crate::errors::AppError;
use crate::forms::normalize_list;
use crate::listing::export::{user_csv, user_csv_filename, CSV_CONTENT_TYPE};
use crate::listing::{filter_users, paginate, user_roles, UserQuery};
use crate::models::cv::{DashboardData, ExperienceStats, JobDescription};
use crate::render::{attachment, choices, format_timestamp, render, Choice, CvRow, PageContext};
use crate::session::CurrentSession;
use crate::state::AppState;

const TOP_LIMIT: u32 = 10;
const MAX_TOP_N: u32 = 50;
/// Users fetched for the in-memory user list.
const USER_FETCH_LIMIT: u32 = 100;

/// Unwraps one independent fetch; a failure is noted and the section renders
/// empty.
fn ok_or_note<T: Default>(
    result: Result<T, ApiError>,
    message: &str,
    errors: &mut Vec<String>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{message}: {e}");
            errors.push(message.to_string());
            T::default()
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub errors: Vec<String>,
    pub total_cvs: u64,
    pub recent: Vec<CvRow>,
    pub cvs: Vec<CvRow>,
    pub top_skills: Vec<Bar>,
    pub top_locations: Vec<Bar>,
    pub education: Vec<Bar>,
    pub experience: ExperienceSummary,
}

/// GET /dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Html<String>, AppError> {
    let api = current.api(&state);
    let (dashboard, cvs, skills, locations, education, experience) = tokio::join!(
        api.dashboard(),
        api.fetch_all_cvs(),
        api.top_skills(TOP_LIMIT),
        api.top_locations(TOP_LIMIT),
        api.education_distribution(),
        api.experience_stats(),
    );

    let mut errors = Vec::new();
    let dashboard: DashboardData = ok_or_note(dashboard, "Failed to load dashboard", &mut errors);
    let cvs = ok_or_note(cvs, "Failed to load CVs", &mut errors);
    let skills = ok_or_note(skills, "Failed to load top skills", &mut errors);
    let locations = ok_or_note(locations, "Failed to load top locations", &mut errors);
    let education = ok_or_note(education, "Failed to load education distribution", &mut errors);
    let experience: ExperienceStats =
        ok_or_note(experience, "Failed to load experience stats", &mut errors);

    render(&DashboardTemplate {
        ctx: PageContext::from_session(&current),
        errors,
        total_cvs: dashboard.total_cvs,
        recent: dashboard.recent.iter().map(CvRow::from).collect(),
        cvs: cvs.iter().map(CvRow::from).collect(),
        top_skills: skill_bars(&skills),
        top_locations: location_bars(&locations),
        education: education_bars(&education),
        experience: ExperienceSummary::from(&experience),
    })
}

#[derive(Template)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub ctx: PageContext,
    pub error: String,
    pub total_cvs: u64,
    pub recent: Vec<CvRow>,
    pub top_skills: Vec<Bar>,
    pub top_locations: Vec<Bar>,
    pub education: Vec<Bar>,
    pub skills_distribution: Vec<Bar>,
    pub experience: ExperienceSummary,
}

/// GET /analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Html<String>, AppError> {
    let mut errors = Vec::new();
    let data = ok_or_note(
        current.api(&state).dashboard().await,
        "Failed to load analytics",
        &mut errors,
    );

    render(&AnalyticsTemplate {
        ctx: PageContext::from_session(&current),
        error: errors.join(" "),
        total_cvs: data.total_cvs,
        recent: data.recent.iter().map(CvRow::from).collect(),
        top_skills: skill_bars(&data.top_skills),
        top_locations: location_bars(&data.top_locations),
        education: education_bars(&data.education_distribution),
        skills_distribution: skill_bars(&data.skills_distribution),
        experience: ExperienceSummary::from(&data.experience_levels),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchForm {
    pub skills: String,
    pub min_experience: String,
    pub top_n: String,
}

impl MatchForm {
    fn to_job(&self) -> Result<JobDescription, String> {
        let skills = normalize_list(&self.skills);
        if skills.is_empty() {
            return Err("Enter at least one skill".to_string());
        }
        let min_experience = match self.min_experience.trim() {
            "" => 0,
            raw => raw
                .parse::<u32>()
                .map_err(|_| "Minimum experience must be a whole number".to_string())?,
        };
        let top_n = match self.top_n.trim() {
            "" => 5,
            raw => raw
                .parse::<u32>()
                .map_err(|_| "Number of candidates must be a whole number".to_string())?
                .clamp(1, MAX_TOP_N),
        };
        Ok(JobDescription {
            skills,
            min_experience,
            top_n,
        })
    }
}

#[derive(Template)]
#[template(path = "match.html")]
pub struct MatchTemplate {
    pub ctx: PageContext,
    pub form: MatchForm,
    pub error: String,
    pub searched: bool,
    pub results: Vec<CvRow>,
}

/// GET /match
pub async fn handle_match_form(current: CurrentSession) -> Result<Html<String>, AppError> {
    render(&MatchTemplate {
        ctx: PageContext::from_session(&current),
        form: MatchForm {
            top_n: "5".to_string(),
            ..Default::default()
        },
        error: String::new(),
        searched: false,
        results: Vec::new(),
    })
}

/// POST /match
pub async fn handle_match(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<MatchForm>,
) -> Result<Html<String>, AppError> {
    let mut page = MatchTemplate {
        ctx: PageContext::from_session(&current),
        form: form.clone(),
        error: String::new(),
        searched: false,
        results: Vec::new(),
    };

    match form.to_job() {
        Err(message) => page.error = message,
        Ok(job) => match current.api(&state).match_candidates(&job).await {
            Ok(cvs) => {
                page.searched = true;
                page.results = cvs.iter().map(CvRow::from).collect();
            }
            Err(e) => {
                warn!("Candidate matching failed: {e}");
                page.error = "Failed to match candidates".to_string();
            }
        },
    }
    render(&page)
}

pub struct UserRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub created: String,
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub error: String,
    pub search: String,
    pub roles: Vec<Choice>,
    pub rows: Vec<UserRow>,
    pub page: usize,
    pub total_pages: usize,
    pub prev_href: String,
    pub next_href: String,
}

fn users_href(query: &UserQuery) -> String {
    let qs = query.to_query_string();
    if qs.is_empty() {
        "/users".to_string()
    } else {
        format!("/users?{qs}")
    }
}

/// GET /users: signed-in sessions only.
pub async fn handle_users(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<UserQuery>,
) -> Result<Response, AppError> {
    if !current.session.is_authenticated() {
        return Ok(Redirect::to("/login").into_response());
    }

    let mut errors = Vec::new();
    let users = ok_or_note(
        current.api(&state).list_users(0, USER_FETCH_LIMIT).await,
        "Failed to load users",
        &mut errors,
    );

    let filtered = filter_users(&users, &query);
    let page = paginate(&filtered, query.page.unwrap_or(1), state.config.page_size);
    let prev_href = if page.has_prev() {
        users_href(&query.with_page(page.page - 1))
    } else {
        String::new()
    };
    let next_href = if page.has_next() {
        users_href(&query.with_page(page.page + 1))
    } else {
        String::new()
    };

    let html = render(&UsersTemplate {
        ctx: PageContext::from_session(&current),
        error: errors.join(" "),
        search: query.search.clone(),
        roles: choices(&user_roles(&users), &query.role),
        rows: page
            .items
            .iter()
            .map(|u| UserRow {
                id: u.id.clone(),
                full_name: u.full_name.clone(),
                email: u.email.clone(),
                role: u.role.to_string(),
                created: u.created_at.as_deref().map(format_timestamp).unwrap_or_default(),
            })
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        prev_href,
        next_href,
    })?;
    Ok(html.into_response())
}

/// GET /users/:id/export.csv: one user's name, email and role.
///
/// The API only lists users, so the record is looked up in the same window
/// the user list shows.
pub async fn handle_export_user(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if !current.session.is_authenticated() {
        return Ok(Redirect::to("/login").into_response());
    }

    let users = current.api(&state).list_users(0, USER_FETCH_LIMIT).await?;
    let user = users
        .iter()
        .find(|u| u.id == id)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(attachment(
        user_csv(user)?,
        CSV_CONTENT_TYPE,
        &user_csv_filename(&user.full_name),
    ))
}
