//! Storage seams for the matching engine. The engine reads candidates and jobs
//! and owns the match table; everything else about those entities belongs to
//! the CRUD layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::matching::error::StoreError;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matching::{MatchRecord, MatchStatus, PersistedMatch, ScoredMatch};

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError>;

    /// Active candidates, most recently created first (ties by id, descending).
    async fn list_active(&self, limit: usize) -> Result<Vec<Candidate>, StoreError>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Active jobs, most recently created first (ties by id, descending).
    async fn list_active(&self, limit: usize) -> Result<Vec<Job>, StoreError>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Atomic create-or-update keyed on (candidate_id, job_id).
    ///
    /// On conflict only the score columns change; `status` and
    /// `candidate_interested` keep whatever the workflow last wrote.
    async fn upsert_scores(&self, scored: &ScoredMatch) -> Result<PersistedMatch, StoreError>;

    async fn get_by_pair(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Highest score first.
    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError>;

    /// Highest score first.
    async fn list_for_job(&self, job_id: Uuid, limit: usize)
        -> Result<Vec<MatchRecord>, StoreError>;

    async fn update_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError>;

    async fn set_candidate_interest(
        &self,
        match_id: Uuid,
        interested: bool,
    ) -> Result<Option<MatchRecord>, StoreError>;
}
