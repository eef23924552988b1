//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::matching::{MatchRecord, MatchStatus};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobCreatedEvent {
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ResumeParsedEvent {
    pub candidate_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct JobsImportedEvent {
    pub job_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub matches_found: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

impl ListParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct PairParams {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: MatchStatus,
}

#[derive(Debug, Deserialize)]
pub struct InterestUpdate {
    pub interested: bool,
}

fn accepted() -> (StatusCode, Json<Value>) {
    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Event triggers (answer first, match in the background)
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/events/job-created
pub async fn handle_job_created(
    State(state): State<AppState>,
    Json(event): Json<JobCreatedEvent>,
) -> (StatusCode, Json<Value>) {
    drop(state.dispatcher.on_job_created(event.job_id));
    accepted()
}

/// POST /api/v1/events/resume-parsed
pub async fn handle_resume_parsed(
    State(state): State<AppState>,
    Json(event): Json<ResumeParsedEvent>,
) -> (StatusCode, Json<Value>) {
    drop(state.dispatcher.on_resume_parsed(event.candidate_id));
    accepted()
}

/// POST /api/v1/events/jobs-imported
pub async fn handle_jobs_imported(
    State(state): State<AppState>,
    Json(event): Json<JobsImportedEvent>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if event.job_ids.is_empty() {
        return Err(AppError::Validation("job_ids cannot be empty".to_string()));
    }
    drop(state.dispatcher.on_jobs_imported(event.job_ids));
    Ok(accepted())
}

// ────────────────────────────────────────────────────────────────────────────
// Manual re-runs
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/candidates/:id/matches/refresh
pub async fn handle_refresh_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<RefreshResponse>, AppError> {
    let matches_found = state.dispatcher.run_for_candidate(candidate_id).await?;
    Ok(Json(RefreshResponse { matches_found }))
}

/// POST /api/v1/jobs/:id/matches/refresh
pub async fn handle_refresh_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RefreshResponse>, AppError> {
    let matches_found = state.dispatcher.run_for_job(job_id).await?;
    Ok(Json(RefreshResponse { matches_found }))
}

// ────────────────────────────────────────────────────────────────────────────
// Reads and workflow updates
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates/:id/matches
pub async fn handle_candidate_matches(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    let matches = state
        .matches
        .list_for_candidate(candidate_id, params.limit())
        .await?;
    Ok(Json(matches))
}

/// GET /api/v1/jobs/:id/matches
pub async fn handle_job_matches(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    let matches = state.matches.list_for_job(job_id, params.limit()).await?;
    Ok(Json(matches))
}

/// GET /api/v1/matches?candidate_id=..&job_id=..
pub async fn handle_match_for_pair(
    State(state): State<AppState>,
    Query(pair): Query<PairParams>,
) -> Result<Json<MatchRecord>, AppError> {
    let record = state
        .matches
        .get_by_pair(pair.candidate_id, pair.job_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No match for candidate {} and job {}",
                pair.candidate_id, pair.job_id
            ))
        })?;
    Ok(Json(record))
}

/// PATCH /api/v1/matches/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<MatchRecord>, AppError> {
    let updated = state
        .matches
        .update_status(match_id, req.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {match_id} not found")))?;
    Ok(Json(updated))
}

/// PATCH /api/v1/matches/:id/interest
pub async fn handle_update_interest(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<InterestUpdate>,
) -> Result<Json<MatchRecord>, AppError> {
    let updated = state
        .matches
        .set_candidate_interest(match_id, req.interested)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {match_id} not found")))?;
    Ok(Json(updated))
}
