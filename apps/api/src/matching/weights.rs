use serde::{Deserialize, Serialize};

/// Per-dimension weights for the overall match score. Immutable once built;
/// the aggregator takes its own copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchWeights {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
    pub job_type: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: 0.40,
            experience: 0.25,
            location: 0.15,
            salary: 0.10,
            job_type: 0.10,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.location + self.salary + self.job_type
    }
}
