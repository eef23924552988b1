use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::matching::aggregator::ScoreAggregator;
use crate::matching::error::MatchingError;
use crate::matching::finder::{FinderLimits, MatchFinder};
use crate::matching::persister::{MatchPersister, DEFAULT_PERSIST_CONCURRENCY};
use crate::matching::store::{CandidateStore, JobStore, MatchStore};
use crate::matching::weights::MatchWeights;
use crate::models::matching::{PersistedMatch, ScoredMatch};

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub weights: MatchWeights,
    pub limits: FinderLimits,
    pub persist_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            limits: FinderLimits::default(),
            persist_concurrency: DEFAULT_PERSIST_CONCURRENCY,
        }
    }
}

/// Entry point used by every trigger: find, then persist.
pub struct MatchEngine {
    candidates: Arc<dyn CandidateStore>,
    jobs: Arc<dyn JobStore>,
    finder: MatchFinder,
    persister: MatchPersister,
}

impl MatchEngine {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        jobs: Arc<dyn JobStore>,
        matches: Arc<dyn MatchStore>,
        settings: EngineSettings,
    ) -> Self {
        let aggregator = ScoreAggregator::new(settings.weights);
        Self {
            candidates: Arc::clone(&candidates),
            jobs: Arc::clone(&jobs),
            finder: MatchFinder::new(candidates, jobs, aggregator, settings.limits),
            persister: MatchPersister::new(matches, settings.persist_concurrency),
        }
    }

    pub async fn compute_matches_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<ScoredMatch>, MatchingError> {
        self.finder.for_candidate(candidate_id).await
    }

    pub async fn compute_matches_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ScoredMatch>, MatchingError> {
        self.finder.for_job(job_id).await
    }

    pub async fn persist_matches(&self, matches: Vec<ScoredMatch>) -> Vec<PersistedMatch> {
        self.persister.persist(matches).await
    }

    pub async fn refresh_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<PersistedMatch>, MatchingError> {
        let found = self.compute_matches_for_candidate(candidate_id).await?;
        let submitted = found.len();
        let saved = self.persist_matches(found).await;

        // Every pair references the anchor, so losses may mean it was deleted mid-run.
        if saved.len() < submitted && self.candidates.get(candidate_id).await?.is_none() {
            warn!(%candidate_id, submitted, saved = saved.len(), "Candidate deleted during matching");
            return Err(MatchingError::candidate_not_found(candidate_id));
        }
        Ok(saved)
    }

    pub async fn refresh_job(&self, job_id: Uuid) -> Result<Vec<PersistedMatch>, MatchingError> {
        let found = self.compute_matches_for_job(job_id).await?;
        let submitted = found.len();
        let saved = self.persist_matches(found).await;

        if saved.len() < submitted && self.jobs.get(job_id).await?.is_none() {
            warn!(%job_id, submitted, saved = saved.len(), "Job deleted during matching");
            return Err(MatchingError::job_not_found(job_id));
        }
        Ok(saved)
    }
}
