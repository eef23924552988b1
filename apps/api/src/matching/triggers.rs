//! Trigger surface: background dispatch for event-driven batches and the
//! synchronous manual re-run path.
//!
//! Background entry points return the task handle immediately. Callers on the
//! request path drop it; the request's outcome never depends on the batch.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::matching::engine::MatchEngine;
use crate::matching::error::MatchingError;
use crate::matching::notifier::{
    MatchHighlight, NewMatchesNotification, NotificationPolicy, Notifier,
};
use crate::matching::store::{CandidateStore, JobStore};
use crate::models::matching::PersistedMatch;

pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

#[derive(Clone)]
pub struct MatchDispatcher {
    engine: Arc<MatchEngine>,
    candidates: Arc<dyn CandidateStore>,
    jobs: Arc<dyn JobStore>,
    notifier: Arc<dyn Notifier>,
    policy: NotificationPolicy,
    batches: Arc<Semaphore>,
}

impl MatchDispatcher {
    pub fn new(
        engine: Arc<MatchEngine>,
        candidates: Arc<dyn CandidateStore>,
        jobs: Arc<dyn JobStore>,
        notifier: Arc<dyn Notifier>,
        policy: NotificationPolicy,
        max_concurrent_batches: usize,
    ) -> Self {
        Self {
            engine,
            candidates,
            jobs,
            notifier,
            policy,
            batches: Arc::new(Semaphore::new(max_concurrent_batches.max(1))),
        }
    }

    /// New posting: match it against the candidate pool. Recruiters are not
    /// notified.
    pub fn on_job_created(&self, job_id: Uuid) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let _permit = this.batch_permit().await;
            match this.engine.refresh_job(job_id).await {
                Ok(saved) => info!(%job_id, persisted = saved.len(), "Job-created matching finished"),
                Err(e) => error!(%job_id, error = %e, "Job-created matching failed"),
            }
        })
    }

    /// Resume parsed and profile updated: match the candidate against open
    /// jobs and announce the best new matches.
    pub fn on_resume_parsed(&self, candidate_id: Uuid) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let _permit = this.batch_permit().await;
            match this.engine.refresh_candidate(candidate_id).await {
                Ok(saved) => {
                    info!(%candidate_id, persisted = saved.len(), "Resume matching finished");
                    this.notify_candidate(candidate_id, &saved).await;
                }
                Err(e) => error!(%candidate_id, error = %e, "Resume matching failed"),
            }
        })
    }

    /// Bulk import: one job at a time, in import order. A job that fails is
    /// logged and the rest still run.
    pub fn on_jobs_imported(&self, job_ids: Vec<Uuid>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let _permit = this.batch_permit().await;
            let total = job_ids.len();
            let mut failed = 0usize;
            for job_id in job_ids {
                if let Err(e) = this.engine.refresh_job(job_id).await {
                    failed += 1;
                    error!(%job_id, error = %e, "Imported job matching failed");
                }
            }
            info!(total, failed, "Imported job matching finished");
        })
    }

    /// Manual re-run for a candidate. Returns the number of persisted matches;
    /// notifications for new high-scoring matches go out in the background.
    pub async fn run_for_candidate(&self, candidate_id: Uuid) -> Result<usize, MatchingError> {
        let saved = self.engine.refresh_candidate(candidate_id).await?;
        let count = saved.len();

        let this = self.clone();
        tokio::spawn(async move {
            this.notify_candidate(candidate_id, &saved).await;
        });

        Ok(count)
    }

    /// Manual re-run for a job, on behalf of a recruiter.
    pub async fn run_for_job(&self, job_id: Uuid) -> Result<usize, MatchingError> {
        let saved = self.engine.refresh_job(job_id).await?;
        Ok(saved.len())
    }

    async fn batch_permit(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.batches).acquire_owned().await.ok()
    }

    async fn notify_candidate(&self, candidate_id: Uuid, saved: &[PersistedMatch]) {
        let picked = self.policy.select(saved);
        if picked.is_empty() {
            return;
        }

        let candidate = match self.candidates.get(candidate_id).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                warn!(%candidate_id, "Candidate vanished before notification");
                return;
            }
            Err(e) => {
                warn!(%candidate_id, error = %e, "Could not load candidate for notification");
                return;
            }
        };
        let email = match candidate.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => {
                debug!(%candidate_id, "Candidate has no email, skipping notification");
                return;
            }
        };

        let mut highlights = Vec::with_capacity(picked.len());
        for record in picked {
            match self.jobs.get(record.job_id).await {
                Ok(Some(job)) => highlights.push(MatchHighlight {
                    match_id: record.id,
                    job_id: job.id,
                    job_title: job.title,
                    company: job.company,
                    match_score: record.match_score,
                    matching_skills: record.match_details.matching_skills.clone(),
                }),
                Ok(None) => debug!(job_id = %record.job_id, "Job gone, leaving it out"),
                Err(e) => warn!(job_id = %record.job_id, error = %e, "Could not load job"),
            }
        }
        if highlights.is_empty() {
            return;
        }

        let notification = NewMatchesNotification {
            candidate_id,
            candidate_name: candidate.full_name.clone(),
            matches: highlights,
        };
        if let Err(e) = self.notifier.send(&email, &notification).await {
            warn!(%candidate_id, error = %e, "Failed to send new-matches notification");
        }
    }
}
