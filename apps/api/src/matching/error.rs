use thiserror::Error;
use uuid::Uuid;

/// Failure inside a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Decode(String),
}

/// Errors raised by the matching engine.
///
/// `Scoring` and `Persistence` are local to one (candidate, job) pair: the
/// batch logs them, skips the pair and carries on. `NotFound` and `Store`
/// abort the whole batch.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Cannot score candidate {candidate_id} against job {job_id}: {reason}")]
    Scoring {
        candidate_id: Uuid,
        job_id: Uuid,
        reason: String,
    },

    #[error("Failed to persist match for candidate {candidate_id} / job {job_id}: {source}")]
    Persistence {
        candidate_id: Uuid,
        job_id: Uuid,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MatchingError {
    pub fn candidate_not_found(id: Uuid) -> Self {
        MatchingError::NotFound {
            entity: "Candidate",
            id,
        }
    }

    pub fn job_not_found(id: Uuid) -> Self {
        MatchingError::NotFound { entity: "Job", id }
    }

    /// True when the error only invalidates a single pair, not the batch.
    pub fn is_pair_local(&self) -> bool {
        matches!(
            self,
            MatchingError::Scoring { .. } | MatchingError::Persistence { .. }
        )
    }
}
