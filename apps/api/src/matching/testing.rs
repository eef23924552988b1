//! Fixtures and an in-memory store for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::matching::error::StoreError;
use crate::matching::labels::{LocationCompatibility, SalaryCompatibility};
use crate::matching::notifier::{NewMatchesNotification, Notifier, NotifyError};
use crate::matching::store::{CandidateStore, JobStore, MatchStore};
use crate::models::candidate::{
    Candidate, CandidateStatus, Experience, Preferences, SkillSet,
};
use crate::models::job::{Job, JobLocation, JobRequirements, JobStatus};
use crate::models::matching::{
    MatchDetails, MatchRecord, MatchStatus, PersistedMatch, ScoreBreakdown, ScoredMatch,
};

fn skill_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Active candidate with an email, no location and no preferences.
pub fn candidate(technical: &[&str], total_years: f64) -> Candidate {
    let id = Uuid::new_v4();
    Candidate {
        id,
        email: Some(format!("{}@example.com", id.simple())),
        full_name: Some("Test Candidate".to_string()),
        skills: SkillSet {
            technical: skill_list(technical),
            soft: vec![],
        },
        experience: Experience {
            total_years,
            jobs: vec![],
        },
        location: None,
        preferences: Preferences::default(),
        status: CandidateStatus::Active,
        created_at: Utc::now(),
    }
}

/// Active on-site job with no experience, salary or type requirements.
pub fn job(technical: &[&str]) -> Job {
    Job {
        id: Uuid::new_v4(),
        title: "Software Engineer".to_string(),
        company: Some("Acme".to_string()),
        requirements: JobRequirements {
            skills: SkillSet {
                technical: skill_list(technical),
                soft: vec![],
            },
            ..Default::default()
        },
        location: JobLocation::default(),
        salary: None,
        job_type: None,
        status: JobStatus::Active,
        created_at: Utc::now(),
    }
}

/// A scored pair whose every field is derived from `score`, so two different
/// scores never produce overlapping payloads.
pub fn scored(candidate_id: Uuid, job_id: Uuid, score: i32) -> ScoredMatch {
    ScoredMatch {
        candidate_id,
        job_id,
        match_score: score,
        score_breakdown: ScoreBreakdown {
            skills_match: score,
            experience_match: score,
            location_match: score,
            salary_match: score,
            job_type_match: score,
        },
        match_details: MatchDetails {
            matching_skills: vec![format!("skill-{score}")],
            missing_skills: vec![],
            experience_difference: score,
            salary_compatibility: SalaryCompatibility::from_score(score),
            location_compatibility: LocationCompatibility::from_score(score),
        },
    }
}

pub fn record(candidate_id: Uuid, job_id: Uuid, score: i32) -> MatchRecord {
    new_record(&scored(candidate_id, job_id, score))
}

fn new_record(scored: &ScoredMatch) -> MatchRecord {
    let now = Utc::now();
    MatchRecord {
        id: Uuid::new_v4(),
        candidate_id: scored.candidate_id,
        job_id: scored.job_id,
        match_score: scored.match_score,
        score_breakdown: scored.score_breakdown,
        match_details: scored.match_details.clone(),
        status: MatchStatus::Pending,
        candidate_interested: None,
        created_at: now,
        updated_at: now,
    }
}

/// All three stores behind plain mutexes. The upsert holds the match lock for
/// the whole find-or-create, matching the atomicity of the SQL statement.
#[derive(Default)]
pub struct InMemoryStore {
    candidates: Mutex<HashMap<Uuid, Candidate>>,
    jobs: Mutex<HashMap<Uuid, Job>>,
    matches: Mutex<HashMap<(Uuid, Uuid), MatchRecord>>,
    failing_jobs: Mutex<HashSet<Uuid>>,
    deleted_on_upsert: Mutex<HashSet<Uuid>>,
}

impl InMemoryStore {
    /// Inserts or replaces by id.
    pub fn add_candidate(&self, candidate: Candidate) {
        self.candidates
            .lock()
            .unwrap()
            .insert(candidate.id, candidate);
    }

    pub fn add_job(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn fail_upserts_for_job(&self, job_id: Uuid) {
        self.failing_jobs.lock().unwrap().insert(job_id);
    }

    /// The first upsert touching `id` deletes that candidate or job and fails,
    /// as the foreign key does when a row goes away mid-batch. Later upserts
    /// referencing it keep failing.
    pub fn delete_on_upsert(&self, id: Uuid) {
        self.deleted_on_upsert.lock().unwrap().insert(id);
    }

    pub fn match_count(&self) -> usize {
        self.matches.lock().unwrap().len()
    }

    fn find_by_id(&self, match_id: Uuid, apply: impl FnOnce(&mut MatchRecord)) -> Option<MatchRecord> {
        let mut matches = self.matches.lock().unwrap();
        let record = matches.values_mut().find(|m| m.id == match_id)?;
        apply(record);
        record.updated_at = Utc::now();
        Some(record.clone())
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        Ok(self.candidates.lock().unwrap().get(&id).cloned())
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<Candidate>, StoreError> {
        let active: Vec<Candidate> = self
            .candidates
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.status == CandidateStatus::Active)
            .cloned()
            .collect();
        let mut sorted = newest_first(active, |c| (c.created_at, c.id));
        sorted.truncate(limit);
        Ok(sorted)
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        let active: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == JobStatus::Active)
            .cloned()
            .collect();
        let mut sorted = newest_first(active, |j| (j.created_at, j.id));
        sorted.truncate(limit);
        Ok(sorted)
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn upsert_scores(&self, scored: &ScoredMatch) -> Result<PersistedMatch, StoreError> {
        if self.failing_jobs.lock().unwrap().contains(&scored.job_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let doomed = self.deleted_on_upsert.lock().unwrap();
        for id in [scored.candidate_id, scored.job_id] {
            if doomed.contains(&id) {
                self.candidates.lock().unwrap().remove(&id);
                self.jobs.lock().unwrap().remove(&id);
                return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                    "foreign key violation: {id} no longer exists"
                ))));
            }
        }
        drop(doomed);

        let mut matches = self.matches.lock().unwrap();
        let key = (scored.candidate_id, scored.job_id);
        if let Some(existing) = matches.get_mut(&key) {
            existing.match_score = scored.match_score;
            existing.score_breakdown = scored.score_breakdown;
            existing.match_details = scored.match_details.clone();
            existing.updated_at = Utc::now();
            return Ok(PersistedMatch {
                record: existing.clone(),
                created: false,
            });
        }

        let record = new_record(scored);
        matches.insert(key, record.clone());
        Ok(PersistedMatch {
            record,
            created: true,
        })
    }

    async fn get_by_pair(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .matches
            .lock()
            .unwrap()
            .get(&(candidate_id, job_id))
            .cloned())
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let mut found: Vec<MatchRecord> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.candidate_id == candidate_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.match_score.cmp(&a.match_score).then(a.job_id.cmp(&b.job_id)));
        found.truncate(limit);
        Ok(found)
    }

    async fn list_for_job(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let mut found: Vec<MatchRecord> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.job_id == job_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn update_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.find_by_id(match_id, |m| m.status = status))
    }

    async fn set_candidate_interest(
        &self,
        match_id: Uuid,
        interested: bool,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.find_by_id(match_id, |m| m.candidate_interested = Some(interested)))
    }
}

/// Captures every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, NewMatchesNotification)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, NewMatchesNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        email: &str,
        notification: &NewMatchesNotification,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), notification.clone()));
        Ok(())
    }
}
