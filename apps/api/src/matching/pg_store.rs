use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::matching::error::StoreError;
use crate::matching::store::{CandidateStore, JobStore, MatchStore};
use crate::models::candidate::{Candidate, CandidateLocation, Experience, Preferences, SkillSet};
use crate::models::job::{Job, JobLocation, JobRequirements, JobSalary, JobType};
use crate::models::matching::{
    MatchDetails, MatchRecord, MatchStatus, PersistedMatch, ScoreBreakdown, ScoredMatch,
};

const CANDIDATE_COLUMNS: &str =
    "id, email, full_name, skills, experience, location, preferences, status, created_at";
const JOB_COLUMNS: &str =
    "id, title, company, requirements, location, salary, job_type, status, created_at";
const MATCH_COLUMNS: &str = "id, candidate_id, job_id, match_score, score_breakdown, \
     match_details, status, candidate_interested, created_at, updated_at";

/// Postgres-backed implementation of all three engine stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    email: Option<String>,
    full_name: Option<String>,
    skills: Value,
    experience: Value,
    location: Option<Value>,
    preferences: Value,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = StoreError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(Candidate {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            skills: from_json::<SkillSet>("skills", row.skills)?,
            experience: from_json::<Experience>("experience", row.experience)?,
            location: row
                .location
                .map(|l| from_json::<CandidateLocation>("location", l))
                .transpose()?,
            preferences: from_json::<Preferences>("preferences", row.preferences)?,
            status: row.status.parse().map_err(StoreError::Decode)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: Option<String>,
    requirements: Value,
    location: Value,
    salary: Option<Value>,
    job_type: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_type = row
            .job_type
            .as_deref()
            .map(str::parse::<JobType>)
            .transpose()
            .map_err(StoreError::Decode)?;

        Ok(Job {
            id: row.id,
            title: row.title,
            company: row.company,
            requirements: from_json::<JobRequirements>("requirements", row.requirements)?,
            location: from_json::<JobLocation>("location", row.location)?,
            salary: row
                .salary
                .map(|s| from_json::<JobSalary>("salary", s))
                .transpose()?,
            job_type,
            status: row.status.parse().map_err(StoreError::Decode)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MatchRow {
    id: Uuid,
    candidate_id: Uuid,
    job_id: Uuid,
    match_score: i32,
    score_breakdown: Json<ScoreBreakdown>,
    match_details: Json<MatchDetails>,
    status: String,
    candidate_interested: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for MatchRecord {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(MatchRecord {
            id: row.id,
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            match_score: row.match_score,
            score_breakdown: row.score_breakdown.0,
            match_details: row.match_details.0,
            status: row.status.parse().map_err(StoreError::Decode)?,
            candidate_interested: row.candidate_interested,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UpsertedMatchRow {
    #[sqlx(flatten)]
    record: MatchRow,
    inserted: bool,
}

/// Profile sub-documents are decoded after the fetch, so one bad row cannot
/// fail the query that loads its neighbours.
fn from_json<T: DeserializeOwned>(column: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Decodes a scanned pool row by row. Rows that do not decode are logged and
/// left out instead of failing the whole scan.
fn decode_pool<R, T>(rows: Vec<R>, entity: &'static str, id: fn(&R) -> Uuid) -> Vec<T>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter()
        .filter_map(|row| {
            let row_id = id(&row);
            T::try_from(row)
                .map_err(|e| warn!(entity, id = %row_id, error = %e, "Skipping undecodable row"))
                .ok()
        })
        .collect()
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ────────────────────────────────────────────────────────────────────────────
// Store implementations
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CandidateStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_active(&self, limit: usize) -> Result<Vec<Candidate>, StoreError> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE status = 'active' \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_pool(rows, "candidate", |r: &CandidateRow| r.id))
    }
}

#[async_trait]
impl JobStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_active(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'active' \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_pool(rows, "job", |r: &JobRow| r.id))
    }
}

#[async_trait]
impl MatchStore for PgStore {
    /// Single-statement upsert: concurrent callers on the same pair are
    /// serialized by the unique index, never by a read-then-write.
    #[instrument(skip(self, scored), fields(candidate_id = %scored.candidate_id, job_id = %scored.job_id))]
    async fn upsert_scores(&self, scored: &ScoredMatch) -> Result<PersistedMatch, StoreError> {
        let upserted = sqlx::query_as::<_, UpsertedMatchRow>(&format!(
            r#"
            INSERT INTO matches
                (id, candidate_id, job_id, match_score, score_breakdown, match_details)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (candidate_id, job_id) DO UPDATE
            SET match_score = EXCLUDED.match_score,
                score_breakdown = EXCLUDED.score_breakdown,
                match_details = EXCLUDED.match_details,
                updated_at = NOW()
            RETURNING {MATCH_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(scored.candidate_id)
        .bind(scored.job_id)
        .bind(scored.match_score)
        .bind(Json(&scored.score_breakdown))
        .bind(Json(&scored.match_details))
        .fetch_one(&self.pool)
        .await?;

        Ok(PersistedMatch {
            record: MatchRecord::try_from(upserted.record)?,
            created: upserted.inserted,
        })
    }

    async fn get_by_pair(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE candidate_id = $1 AND job_id = $2"
        ))
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MatchRecord::try_from).transpose()
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE candidate_id = $1 \
             ORDER BY match_score DESC, job_id LIMIT $2"
        ))
        .bind(candidate_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn list_for_job(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE job_id = $1 \
             ORDER BY match_score DESC, candidate_id LIMIT $2"
        ))
        .bind(job_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn update_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "UPDATE matches SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MatchRecord::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn set_candidate_interest(
        &self,
        match_id: Uuid,
        interested: bool,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "UPDATE matches SET candidate_interested = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(interested)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MatchRecord::try_from).transpose()
    }
}
