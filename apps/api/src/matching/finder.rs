//! Scans a bounded pool of counterparts for one anchor entity and ranks them.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::matching::aggregator::ScoreAggregator;
use crate::matching::error::MatchingError;
use crate::matching::store::{CandidateStore, JobStore};
use crate::models::matching::ScoredMatch;

/// Scan caps and result limits. Scans are capped rather than exhaustive so a
/// batch has a predictable cost regardless of corpus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderLimits {
    /// Active jobs scanned for one candidate.
    pub job_scan_cap: usize,
    /// Active candidates scanned for one job.
    pub candidate_scan_cap: usize,
    /// Anything scoring below this is dropped.
    pub min_score: i32,
    pub max_matches_per_candidate: usize,
    pub max_matches_per_job: usize,
}

impl Default for FinderLimits {
    fn default() -> Self {
        Self {
            job_scan_cap: 100,
            candidate_scan_cap: 200,
            min_score: 30,
            max_matches_per_candidate: 20,
            max_matches_per_job: 50,
        }
    }
}

pub struct MatchFinder {
    candidates: Arc<dyn CandidateStore>,
    jobs: Arc<dyn JobStore>,
    aggregator: ScoreAggregator,
    limits: FinderLimits,
}

impl MatchFinder {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        jobs: Arc<dyn JobStore>,
        aggregator: ScoreAggregator,
        limits: FinderLimits,
    ) -> Self {
        Self {
            candidates,
            jobs,
            aggregator,
            limits,
        }
    }

    /// Best-scoring active jobs for one candidate, highest score first.
    pub async fn for_candidate(&self, candidate_id: Uuid) -> Result<Vec<ScoredMatch>, MatchingError> {
        let candidate = self
            .candidates
            .get(candidate_id)
            .await?
            .ok_or_else(|| MatchingError::candidate_not_found(candidate_id))?;

        let jobs = self.jobs.list_active(self.limits.job_scan_cap).await?;
        let scanned = jobs.len();

        let scored = jobs.iter().map(|job| self.aggregator.score(&candidate, job));
        let ranked = self.rank(scored, self.limits.max_matches_per_candidate, |m| m.job_id);

        info!(
            %candidate_id,
            scanned,
            matched = ranked.len(),
            "Computed job matches for candidate"
        );
        Ok(ranked)
    }

    /// Best-scoring active candidates for one job, highest score first.
    pub async fn for_job(&self, job_id: Uuid) -> Result<Vec<ScoredMatch>, MatchingError> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| MatchingError::job_not_found(job_id))?;

        let candidates = self
            .candidates
            .list_active(self.limits.candidate_scan_cap)
            .await?;
        let scanned = candidates.len();

        let scored = candidates
            .iter()
            .map(|candidate| self.aggregator.score(candidate, &job));
        let ranked = self.rank(scored, self.limits.max_matches_per_job, |m| m.candidate_id);

        info!(
            %job_id,
            scanned,
            matched = ranked.len(),
            "Computed candidate matches for job"
        );
        Ok(ranked)
    }

    /// Drops unscorable pairs and anything under the threshold, then orders by
    /// score descending. Equal scores are ordered by the counterpart id.
    fn rank(
        &self,
        scored: impl Iterator<Item = Result<ScoredMatch, MatchingError>>,
        limit: usize,
        counterpart: fn(&ScoredMatch) -> Uuid,
    ) -> Vec<ScoredMatch> {
        let mut kept: Vec<ScoredMatch> = scored
            .filter_map(|result| match result {
                Ok(m) => Some(m),
                Err(e) if e.is_pair_local() => {
                    warn!(error = %e, "Skipping unscorable pair");
                    None
                }
                Err(e) => {
                    error!(error = %e, "Unexpected error while scoring pair");
                    None
                }
            })
            .filter(|m| m.match_score >= self.limits.min_score)
            .collect();

        kept.sort_by(|a, b| by_score_desc(a, b).then_with(|| counterpart(a).cmp(&counterpart(b))));
        kept.truncate(limit);
        kept
    }
}

fn by_score_desc(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.match_score.cmp(&a.match_score)
}
