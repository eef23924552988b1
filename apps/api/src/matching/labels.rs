//! Presentation bands for already-computed sub-scores. Nothing here feeds back
//! into scoring.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SalaryCompatibility {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl SalaryCompatibility {
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            SalaryCompatibility::Excellent
        } else if score >= 60 {
            SalaryCompatibility::Good
        } else if score >= 40 {
            SalaryCompatibility::Moderate
        } else {
            SalaryCompatibility::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationCompatibility {
    #[serde(rename = "Perfect Match")]
    PerfectMatch,
    #[serde(rename = "Same Region")]
    SameRegion,
    #[serde(rename = "Same Country")]
    SameCountry,
    #[serde(rename = "Different Location")]
    DifferentLocation,
}

impl LocationCompatibility {
    pub fn from_score(score: i32) -> Self {
        if score >= 100 {
            LocationCompatibility::PerfectMatch
        } else if score >= 75 {
            LocationCompatibility::SameRegion
        } else if score >= 50 {
            LocationCompatibility::SameCountry
        } else {
            LocationCompatibility::DifferentLocation
        }
    }
}
