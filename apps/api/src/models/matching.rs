use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::labels::{LocationCompatibility, SalaryCompatibility};

/// Recruiter-owned workflow state. The engine sets `Pending` on creation and
/// never writes it again.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Shortlisted,
    Rejected,
    Hired,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Shortlisted => "shortlisted",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Hired => "hired",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "shortlisted" => Ok(MatchStatus::Shortlisted),
            "rejected" => Ok(MatchStatus::Rejected),
            "hired" => Ok(MatchStatus::Hired),
            other => Err(format!("unknown match status '{other}'")),
        }
    }
}

/// Rounded per-dimension sub-scores, each 0 – 100.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub skills_match: i32,
    pub experience_match: i32,
    pub location_match: i32,
    pub salary_match: i32,
    pub job_type_match: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchDetails {
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Candidate years minus the job's minimum; negative when under-qualified.
    pub experience_difference: i32,
    pub salary_compatibility: SalaryCompatibility,
    pub location_compatibility: LocationCompatibility,
}

/// Output of the finder for one (candidate, job) pair, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMatch {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub match_score: i32,
    pub score_breakdown: ScoreBreakdown,
    pub match_details: MatchDetails,
}

/// The persisted match. At most one exists per (candidate_id, job_id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub match_score: i32,
    pub score_breakdown: ScoreBreakdown,
    pub match_details: MatchDetails,
    pub status: MatchStatus,
    pub candidate_interested: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an upsert: the stored row, plus whether this call created it.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedMatch {
    pub record: MatchRecord,
    pub created: bool,
}
