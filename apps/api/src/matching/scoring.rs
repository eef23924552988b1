//! Per-dimension sub-scores. Every function here is pure and total: any
//! combination of present/absent inputs yields a finite value in 0 – 100.
//!
//! Missing data is scored as "no signal" rather than as a mismatch, except for
//! skills, where an empty union scores 0.

use std::collections::BTreeSet;

use crate::models::candidate::{CandidateLocation, SalaryRange, SkillSet};
use crate::models::job::{ExperienceRange, JobLocation, JobSalary, JobType};

const FULL: f64 = 100.0;

/// Points lost per year below the job's minimum.
const UNDER_QUALIFIED_PENALTY: f64 = 20.0;
/// Points lost per year above the job's maximum.
const OVER_QUALIFIED_PENALTY: f64 = 10.0;
/// Width assumed when a job only states a minimum.
const OPEN_ENDED_EXPERIENCE_SPAN: f64 = 10.0;

const CANDIDATE_MAX_SALARY_FACTOR: f64 = 1.5;
const JOB_MAX_SALARY_FACTOR: f64 = 1.3;
/// Candidate would accept less than the job's floor.
const UNDER_ASKING_SALARY_SCORE: f64 = 50.0;

const UNKNOWN_LOCATION_SCORE: f64 = 50.0;
const SAME_CITY_SCORE: f64 = 100.0;
const SAME_STATE_SCORE: f64 = 75.0;
const SAME_COUNTRY_SCORE: f64 = 50.0;
const DIFFERENT_COUNTRY_SCORE: f64 = 25.0;

/// Trims and case-folds skill tokens, dropping blanks and duplicates.
pub fn normalize_skills(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard similarity of the technical skill sets, scaled to 0 – 100.
pub fn skills_score(candidate: &SkillSet, job: &SkillSet) -> f64 {
    let have = normalize_skills(&candidate.technical);
    let want = normalize_skills(&job.technical);

    let union = have.union(&want).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = have.intersection(&want).count();
    (intersection as f64 / union as f64) * FULL
}

pub fn experience_score(total_years: f64, required: &ExperienceRange) -> f64 {
    let years = if total_years.is_finite() && total_years > 0.0 {
        total_years
    } else {
        0.0
    };
    let min = required.min.filter(|v| v.is_finite());
    let max = required.max.filter(|v| v.is_finite());

    let (min, max) = match (min, max) {
        (None, None) => return FULL,
        (None, Some(max)) => (0.0, max),
        (Some(min), None) => (min, min + OPEN_ENDED_EXPERIENCE_SPAN),
        (Some(min), Some(max)) => (min, max),
    };

    if years < min {
        (FULL - UNDER_QUALIFIED_PENALTY * (min - years)).max(0.0)
    } else if years > max {
        (FULL - OVER_QUALIFIED_PENALTY * (years - max)).max(0.0)
    } else {
        FULL
    }
}

pub fn location_score(candidate: Option<&CandidateLocation>, job: &JobLocation) -> f64 {
    if job.remote {
        return FULL;
    }
    let candidate = match candidate {
        Some(loc) if !loc.is_empty() => loc,
        _ => return UNKNOWN_LOCATION_SCORE,
    };

    if same_place(&candidate.city, &job.city) {
        SAME_CITY_SCORE
    } else if same_place(&candidate.state, &job.state) {
        SAME_STATE_SCORE
    } else if same_place(&candidate.country, &job.country) {
        SAME_COUNTRY_SCORE
    } else {
        DIFFERENT_COUNTRY_SCORE
    }
}

fn same_place(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref().map(str::trim), b.as_deref().map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Overlap of the expected and offered salary ranges, relative to the width
/// of the candidate's range.
pub fn salary_score(expected: Option<&SalaryRange>, offered: Option<&JobSalary>) -> f64 {
    let c_min = expected.and_then(|r| positive(r.min));
    let j_min = offered.and_then(|s| positive(s.min));
    let (c_min, j_min) = match (c_min, j_min) {
        (Some(c), Some(j)) => (c, j),
        _ => return FULL,
    };

    let c_max = expected
        .and_then(|r| positive(r.max))
        .unwrap_or(c_min * CANDIDATE_MAX_SALARY_FACTOR)
        .max(c_min);
    let j_max = offered
        .and_then(|s| positive(s.max))
        .unwrap_or(j_min * JOB_MAX_SALARY_FACTOR)
        .max(j_min);

    let overlap_start = c_min.max(j_min);
    let overlap_end = c_max.min(j_max);

    if overlap_start <= overlap_end {
        let width = c_max - c_min;
        if width <= 0.0 {
            // Point expectation inside the offered range.
            return FULL;
        }
        ((overlap_end - overlap_start) / width * FULL).clamp(0.0, FULL)
    } else if c_min > j_max {
        let gap = c_min - j_max;
        (FULL - FULL * (gap / c_min)).max(0.0)
    } else {
        UNDER_ASKING_SALARY_SCORE
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Binary: the job type is either acceptable to the candidate or it isn't.
pub fn job_type_score(preferred: &[String], job_type: Option<JobType>) -> f64 {
    let preferred: BTreeSet<String> = preferred
        .iter()
        .map(|p| normalize_job_type(p))
        .filter(|p| !p.is_empty())
        .collect();

    if preferred.is_empty() {
        return FULL;
    }
    match job_type {
        None => FULL,
        Some(jt) if preferred.contains(jt.as_str()) => FULL,
        Some(_) => 0.0,
    }
}

/// "Full Time", "full_time" and "FULL-TIME" all name the same type.
fn normalize_job_type(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect()
}
