pub mod health;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers as dashboard;
use crate::detail::handlers as detail;
use crate::forms::handlers as forms;
use crate::listing::handlers as listing;
use crate::session::handlers as session;
use crate::state::AppState;

async fn redirect_to_list() -> Redirect {
    Redirect::to("/cvs")
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        // Session
        .route(
            "/login",
            get(session::handle_login_page).post(session::handle_login),
        )
        .route(
            "/register",
            get(session::handle_register_page).post(session::handle_register),
        )
        .route("/logout", post(session::handle_logout))
        // Overview pages
        .route("/dashboard", get(dashboard::handle_dashboard))
        .route("/analytics", get(dashboard::handle_analytics))
        .route(
            "/match",
            get(dashboard::handle_match_form).post(dashboard::handle_match),
        )
        .route("/users", get(dashboard::handle_users))
        .route("/users/:id/export.csv", get(dashboard::handle_export_user))
        // CVs
        .route("/cvs", get(listing::handle_list).post(forms::handle_create))
        .route("/cvs/export.csv", get(listing::handle_export_list))
        .route("/cvs/new", get(forms::handle_new))
        .route(
            "/cvs/:id",
            get(detail::handle_detail).post(forms::handle_update),
        )
        .route("/cvs/:id/edit", get(forms::handle_edit))
        .route("/cvs/:id/delete", post(listing::handle_delete))
        .route("/cvs/:id/export.csv", get(detail::handle_export_detail))
        .route("/cvs/:id/summary.csv", get(detail::handle_export_summary))
        .route("/cvs/:id/export.json", get(detail::handle_export_json))
        .fallback(redirect_to_list)
        .with_state(state)
}
