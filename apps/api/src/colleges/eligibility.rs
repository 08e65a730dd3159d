//! Recommendation/Eligibility Engine.
//!
//! Given an exam result (rank and/or percentile) and a reservation category,
//! classifies each college accepting that exam as `eligible`, `reach` or
//! excluded, then orders the survivors by NIRF ranking.
//!
//! Rank wins whenever both the candidate and the college supply one; the
//! percentile path is only consulted when the rank comparison is unavailable.
//! A reach college is within 20% of the rank cutoff, computed in integers
//! (`rank * 5 <= cutoff * 6`) so the boundary is exact.

use serde::{Deserialize, Serialize};

use crate::catalog::models::{College, Cutoff};
use crate::errors::AppError;

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    pub exam_name: Option<String>,
    pub rank: Option<i64>,
    pub percentile: Option<f64>,
    pub category: Option<String>,
    #[serde(default)]
    pub preferred_states: Vec<String>,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityStatus {
    Eligible,
    Reach,
}

/// A validated exam result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub rank: Option<u64>,
    pub percentile: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Criteria {
    pub exam: String,
    pub rank: Option<u64>,
    pub percentile: Option<f64>,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct CollegeRecommendation<'a> {
    #[serde(flatten)]
    pub college: &'a College,
    pub eligibility_status: EligibilityStatus,
    pub cutoff_info: &'a Cutoff,
}

#[derive(Debug, Serialize)]
pub struct Recommendations<'a> {
    pub recommendations: Vec<CollegeRecommendation<'a>>,
    pub total: usize,
    pub criteria: Criteria,
}

/// Decides where a score lands against one published cutoff.
pub fn classify(cutoff: &Cutoff, score: Score) -> Option<EligibilityStatus> {
    let rank_pair = score.rank.zip(cutoff.rank.map(u64::from));

    let eligible = match (rank_pair, score.percentile.zip(cutoff.percentile)) {
        (Some((rank, cutoff_rank)), _) => rank <= cutoff_rank,
        (None, Some((pct, cutoff_pct))) => pct >= cutoff_pct,
        (None, None) => false,
    };

    if eligible {
        return Some(EligibilityStatus::Eligible);
    }
    match rank_pair {
        Some((rank, cutoff_rank)) if rank.saturating_mul(5) <= cutoff_rank * 6 => {
            Some(EligibilityStatus::Reach)
        }
        _ => None,
    }
}

fn validate(req: &RecommendationRequest) -> Result<(String, Score, String), AppError> {
    let exam = req
        .exam_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Exam name and rank/percentile are required".into()))?;

    if req.rank.is_none() && req.percentile.is_none() {
        return Err(AppError::InvalidInput(
            "Exam name and rank/percentile are required".into(),
        ));
    }

    let rank = match req.rank {
        Some(r) if r <= 0 => {
            return Err(AppError::Validation("rank must be a positive integer".into()))
        }
        Some(r) => Some(r as u64),
        None => None,
    };

    if let Some(p) = req.percentile {
        if !(0.0..=100.0).contains(&p) {
            return Err(AppError::Validation(
                "percentile must be between 0 and 100".into(),
            ));
        }
    }

    let category = req
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_lowercase();

    Ok((
        exam.to_string(),
        Score {
            rank,
            percentile: req.percentile,
        },
        category,
    ))
}

fn in_preferences(value: &str, preferences: &[String]) -> bool {
    preferences.is_empty() || preferences.iter().any(|p| p.eq_ignore_ascii_case(value))
}

pub fn recommend_colleges<'a>(
    colleges: &'a [College],
    req: &RecommendationRequest,
) -> Result<Recommendations<'a>, AppError> {
    let (exam, score, category) = validate(req)?;

    let mut recommendations: Vec<CollegeRecommendation<'a>> = colleges
        .iter()
        .filter(|college| college.accepts(&exam))
        .filter_map(|college| {
            let cutoff = college.cutoff(&exam, &category)?;
            let status = classify(cutoff, score)?;
            Some(CollegeRecommendation {
                college,
                eligibility_status: status,
                cutoff_info: cutoff,
            })
        })
        .filter(|r| in_preferences(&r.college.state, &req.preferred_states))
        .filter(|r| in_preferences(&r.college.category, &req.preferred_categories))
        .collect();

    recommendations.sort_by_key(|r| r.college.nirf_ranking);

    Ok(Recommendations {
        total: recommendations.len(),
        recommendations,
        criteria: Criteria {
            exam,
            rank: score.rank,
            percentile: score.percentile,
            category,
        },
    })
}
