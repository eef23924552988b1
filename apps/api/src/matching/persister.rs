//! Writes finder results through the atomic upsert-by-pair primitive.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::matching::error::MatchingError;
use crate::matching::store::MatchStore;
use crate::models::matching::{PersistedMatch, ScoredMatch};

pub const DEFAULT_PERSIST_CONCURRENCY: usize = 8;

pub struct MatchPersister {
    store: Arc<dyn MatchStore>,
    concurrency: usize,
}

impl MatchPersister {
    pub fn new(store: Arc<dyn MatchStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Upserts every pair independently on a bounded pool of tasks.
    ///
    /// A pair that fails is logged and left out of the result; it never
    /// aborts the rest of the batch. The returned list is ordered highest
    /// score first regardless of completion order.
    pub async fn persist(&self, matches: Vec<ScoredMatch>) -> Vec<PersistedMatch> {
        if matches.is_empty() {
            return Vec::new();
        }

        let submitted = matches.len();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for scored in matches {
            let store = Arc::clone(&self.store);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                store
                    .upsert_scores(&scored)
                    .await
                    .map_err(|source| MatchingError::Persistence {
                        candidate_id: scored.candidate_id,
                        job_id: scored.job_id,
                        source,
                    })
            });
        }

        let mut persisted = Vec::with_capacity(submitted);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(saved)) => persisted.push(saved),
                Ok(Err(MatchingError::Persistence {
                    candidate_id,
                    job_id,
                    source,
                })) => {
                    warn!(%candidate_id, %job_id, error = %source, "Skipping pair: upsert failed");
                }
                Ok(Err(other)) => warn!(error = %other, "Skipping pair"),
                Err(join_err) => error!(error = %join_err, "Upsert task aborted"),
            }
        }

        persisted.sort_by(highest_score_first);

        let created = persisted.iter().filter(|p| p.created).count();
        info!(
            submitted,
            persisted = persisted.len(),
            created,
            "Persisted match batch"
        );
        persisted
    }
}

fn highest_score_first(a: &PersistedMatch, b: &PersistedMatch) -> Ordering {
    b.record
        .match_score
        .cmp(&a.record.match_score)
        .then_with(|| a.record.candidate_id.cmp(&b.record.candidate_id))
        .then_with(|| a.record.job_id.cmp(&b.record.job_id))
}
