pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Upstream events: answered immediately, matched in the background
        .route(
            "/api/v1/events/job-created",
            post(handlers::handle_job_created),
        )
        .route(
            "/api/v1/events/resume-parsed",
            post(handlers::handle_resume_parsed),
        )
        .route(
            "/api/v1/events/jobs-imported",
            post(handlers::handle_jobs_imported),
        )
        // Manual re-runs
        .route(
            "/api/v1/candidates/:id/matches/refresh",
            post(handlers::handle_refresh_candidate),
        )
        .route(
            "/api/v1/jobs/:id/matches/refresh",
            post(handlers::handle_refresh_job),
        )
        // Match reads and workflow updates
        .route(
            "/api/v1/candidates/:id/matches",
            get(handlers::handle_candidate_matches),
        )
        .route("/api/v1/jobs/:id/matches", get(handlers::handle_job_matches))
        .route("/api/v1/matches", get(handlers::handle_match_for_pair))
        .route(
            "/api/v1/matches/:id/status",
            patch(handlers::handle_update_status),
        )
        .route(
            "/api/v1/matches/:id/interest",
            patch(handlers::handle_update_interest),
        )
        .with_state(state)
}
