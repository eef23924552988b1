//! Combines the five sub-scores into one overall score plus the explanatory
//! breakdown stored alongside every match.

use crate::matching::error::MatchingError;
use crate::matching::labels::{LocationCompatibility, SalaryCompatibility};
use crate::matching::scoring::{
    experience_score, job_type_score, location_score, normalize_skills, salary_score,
    skills_score,
};
use crate::matching::weights::MatchWeights;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matching::{MatchDetails, ScoreBreakdown, ScoredMatch};

/// Raw (unrounded) sub-scores for one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
    pub job_type: f64,
}

impl SubScores {
    pub fn weighted_total(&self, weights: &MatchWeights) -> f64 {
        weights.skills * self.skills
            + weights.experience * self.experience
            + weights.location * self.location
            + weights.salary * self.salary
            + weights.job_type * self.job_type
    }

    pub fn rounded(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            skills_match: round_score(self.skills),
            experience_match: round_score(self.experience),
            location_match: round_score(self.location),
            salary_match: round_score(self.salary),
            job_type_match: round_score(self.job_type),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    weights: MatchWeights,
}

impl ScoreAggregator {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn sub_scores(candidate: &Candidate, job: &Job) -> SubScores {
        SubScores {
            skills: skills_score(&candidate.skills, &job.requirements.skills),
            experience: experience_score(
                candidate.experience.total_years,
                &job.requirements.experience,
            ),
            location: location_score(candidate.location.as_ref(), &job.location),
            salary: salary_score(
                candidate.preferences.expected_salary.as_ref(),
                job.salary.as_ref(),
            ),
            job_type: job_type_score(&candidate.preferences.job_type, job.job_type),
        }
    }

    /// Scores one pair. Fails only when an input carries a number that cannot
    /// be meaningfully scored.
    pub fn score(&self, candidate: &Candidate, job: &Job) -> Result<ScoredMatch, MatchingError> {
        if let Some(reason) = invalid_numbers(candidate, job) {
            return Err(MatchingError::Scoring {
                candidate_id: candidate.id,
                job_id: job.id,
                reason,
            });
        }

        let sub = Self::sub_scores(candidate, job);
        let breakdown = sub.rounded();
        let match_score = round_score(sub.weighted_total(&self.weights));

        Ok(ScoredMatch {
            candidate_id: candidate.id,
            job_id: job.id,
            match_score,
            score_breakdown: breakdown,
            match_details: match_details(candidate, job, &breakdown),
        })
    }
}

fn match_details(candidate: &Candidate, job: &Job, breakdown: &ScoreBreakdown) -> MatchDetails {
    let have = normalize_skills(&candidate.skills.technical);
    let want = normalize_skills(&job.requirements.skills.technical);

    let required_min = job.requirements.experience.min.unwrap_or(0.0);
    let experience_difference = (candidate.experience.total_years - required_min).round() as i32;

    MatchDetails {
        matching_skills: have.intersection(&want).cloned().collect(),
        missing_skills: want.difference(&have).cloned().collect(),
        experience_difference,
        salary_compatibility: SalaryCompatibility::from_score(breakdown.salary_match),
        location_compatibility: LocationCompatibility::from_score(breakdown.location_match),
    }
}

fn invalid_numbers(candidate: &Candidate, job: &Job) -> Option<String> {
    let years = candidate.experience.total_years;
    if !years.is_finite() || years < 0.0 {
        return Some(format!("candidate total_years is {years}"));
    }

    let mut checks: Vec<(&str, Option<f64>)> = vec![
        ("job experience min", job.requirements.experience.min),
        ("job experience max", job.requirements.experience.max),
    ];
    if let Some(expected) = &candidate.preferences.expected_salary {
        checks.push(("candidate salary min", expected.min));
        checks.push(("candidate salary max", expected.max));
    }
    if let Some(salary) = &job.salary {
        checks.push(("job salary min", salary.min));
        checks.push(("job salary max", salary.max));
    }

    checks.into_iter().find_map(|(field, value)| match value {
        Some(v) if !v.is_finite() => Some(format!("{field} is {v}")),
        _ => None,
    })
}

fn round_score(value: f64) -> i32 {
    value.round().clamp(0.0, 100.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::testing::{candidate, job};
    use crate::models::candidate::{CandidateLocation, SalaryRange};
    use crate::models::job::{ExperienceRange, JobSalary, JobType};

    #[test]
    fn test_perfect_remote_match_scores_100() {
        let mut c = candidate(&["react", "node"], 2.0);
        c.location = None;
        let mut j = job(&["react", "node"]);
        j.location.remote = true;
        j.requirements.experience = ExperienceRange {
            min: Some(0.0),
            max: Some(5.0),
        };

        let scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert_eq!(
            scored.score_breakdown,
            ScoreBreakdown {
                skills_match: 100,
                experience_match: 100,
                location_match: 100,
                salary_match: 100,
                job_type_match: 100,
            }
        );
        assert_eq!(scored.match_score, 100);
        assert_eq!(
            scored.match_details.location_compatibility,
            LocationCompatibility::PerfectMatch
        );
        assert_eq!(
            scored.match_details.salary_compatibility,
            SalaryCompatibility::Excellent
        );
    }

    #[test]
    fn test_disjoint_skills_details() {
        let c = candidate(&["python"], 3.0);
        let j = job(&["Java", "spring"]);

        let scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert_eq!(scored.score_breakdown.skills_match, 0);
        assert!(scored.match_details.matching_skills.is_empty());
        assert_eq!(scored.match_details.missing_skills, vec!["java", "spring"]);
    }

    #[test]
    fn test_experience_difference_is_signed() {
        let c = candidate(&["rust"], 0.0);
        let mut j = job(&["rust"]);
        j.requirements.experience = ExperienceRange {
            min: Some(3.0),
            max: Some(6.0),
        };

        let scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert_eq!(scored.score_breakdown.experience_match, 40);
        assert_eq!(scored.match_details.experience_difference, -3);
    }

    #[test]
    fn test_overall_is_weighted_sum_of_sub_scores() {
        let mut c = candidate(&["rust", "go"], 4.0);
        c.location = Some(CandidateLocation {
            city: Some("Lyon".to_string()),
            state: None,
            country: Some("France".to_string()),
        });
        c.preferences.job_type = vec!["contract".to_string()];
        let mut j = job(&["rust", "kafka"]);
        j.location.country = Some("France".to_string());
        j.job_type = Some(JobType::FullTime);

        let sub = ScoreAggregator::sub_scores(&c, &j);
        // skills 33.3, experience 100, location 50, salary 100, job type 0
        let expected = 0.40 * sub.skills + 0.25 * 100.0 + 0.15 * 50.0 + 0.10 * 100.0;
        let scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert_eq!(scored.match_score, expected.round() as i32);
        assert_eq!(scored.score_breakdown.job_type_match, 0);
    }

    #[test]
    fn test_alternate_weights_are_honoured() {
        let skills_only = MatchWeights {
            skills: 1.0,
            experience: 0.0,
            location: 0.0,
            salary: 0.0,
            job_type: 0.0,
        };
        let c = candidate(&["python"], 1.0);
        let j = job(&["java"]);

        let scored = ScoreAggregator::new(skills_only).score(&c, &j).unwrap();
        assert_eq!(scored.match_score, 0);
        let default_scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert!(default_scored.match_score > 0);
    }

    #[test]
    fn test_non_finite_years_is_a_scoring_error() {
        let c = candidate(&["rust"], f64::NAN);
        let j = job(&["rust"]);

        let err = ScoreAggregator::default().score(&c, &j).unwrap_err();
        assert!(matches!(err, MatchingError::Scoring { .. }));
        assert!(err.is_pair_local());
    }

    #[test]
    fn test_non_finite_salary_is_a_scoring_error() {
        let mut c = candidate(&["rust"], 2.0);
        c.preferences.expected_salary = Some(SalaryRange {
            min: Some(f64::INFINITY),
            max: None,
        });
        let mut j = job(&["rust"]);
        j.salary = Some(JobSalary {
            min: Some(10.0),
            max: None,
            currency: None,
        });

        assert!(ScoreAggregator::default().score(&c, &j).is_err());
    }

    #[test]
    fn test_overall_bounded_for_empty_profiles() {
        let c = candidate(&[], 0.0);
        let j = job(&[]);
        let scored = ScoreAggregator::default().score(&c, &j).unwrap();
        assert!((0..=100).contains(&scored.match_score));
        assert_eq!(scored.score_breakdown.skills_match, 0);
    }
}
