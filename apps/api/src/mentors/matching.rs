//! Mentor Matching Engine.
//!
//! Two entry points share the filter pipeline: the general listing (sorted by
//! rating) and the criteria search (sorted by rating, then success stories).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::models::Mentor;
use crate::errors::AppError;
use crate::query::filter::{any_tag_matches, contains_ignore_case, present};
use crate::query::Query;

/// Per-session price buckets. Boundaries are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub fn classify(per_session: u32) -> Self {
        match per_session {
            0..=400 => BudgetTier::Low,
            401..=600 => BudgetTier::Medium,
            _ => BudgetTier::High,
        }
    }
}

impl FromStr for BudgetTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(BudgetTier::Low),
            "medium" => Ok(BudgetTier::Medium),
            "high" => Ok(BudgetTier::High),
            other => Err(AppError::Validation(format!(
                "budget_range must be one of low, medium, high (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MentorFilter {
    pub college: Option<String>,
    pub expertise: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub max_price: Option<u32>,
    /// Defaults to `true` when absent.
    pub available_only: Option<bool>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MentorSearch {
    pub target_exam: Option<String>,
    pub preferred_college: Option<String>,
    pub budget_range: Option<String>,
    #[serde(default)]
    pub expertise_areas: Vec<String>,
}

pub fn filter_mentors<'a>(mentors: &'a [Mentor], filter: MentorFilter) -> Vec<&'a Mentor> {
    let available_only = filter.available_only.unwrap_or(true);

    Query::new()
        .filter_by(present(filter.college), |m: &Mentor, v| {
            contains_ignore_case(&m.college, v)
        })
        .filter_by(present(filter.expertise), |m: &Mentor, v| {
            any_tag_matches(&m.expertise, std::slice::from_ref(v))
        })
        .filter_by(present(filter.location), |m: &Mentor, v| {
            contains_ignore_case(&m.location, v)
        })
        .filter_by(filter.min_rating, |m: &Mentor, min| m.rating >= *min)
        .filter_by(filter.max_price, |m: &Mentor, max| m.pricing.per_session <= *max)
        .filter(move |m: &Mentor| !available_only || m.is_available)
        .sort_by(|a: &Mentor, b: &Mentor| b.rating.total_cmp(&a.rating))
        .run(mentors)
}

pub fn search_mentors<'a>(
    mentors: &'a [Mentor],
    search: &MentorSearch,
) -> Result<Vec<&'a Mentor>, AppError> {
    let tier = present(search.budget_range.clone())
        .map(|raw| raw.parse::<BudgetTier>())
        .transpose()?;
    let areas = (!search.expertise_areas.is_empty()).then(|| search.expertise_areas.clone());

    Ok(Query::new()
        .filter_by(present(search.target_exam.clone()), |m: &Mentor, exam| {
            any_tag_matches(&m.specializations, std::slice::from_ref(exam))
        })
        .filter_by(present(search.preferred_college.clone()), |m: &Mentor, v| {
            contains_ignore_case(&m.college, v)
        })
        .filter_by(tier, |m: &Mentor, tier| {
            BudgetTier::classify(m.pricing.per_session) == *tier
        })
        .filter_by(areas, |m: &Mentor, areas| any_tag_matches(&m.expertise, areas))
        .sort_by(|a: &Mentor, b: &Mentor| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| b.success_stories.cmp(&a.success_stories))
        })
        .run(mentors))
}

/// Sorted distinct expertise tags across all mentors.
pub fn expertise_categories(mentors: &[Mentor]) -> Vec<&str> {
    let mut tags: Vec<&str> = mentors
        .iter()
        .flat_map(|m| m.expertise.iter().map(String::as_str))
        .collect();
    tags.sort_unstable();
    tags.dedup();
    tags
}

pub fn mentor_colleges(mentors: &[Mentor]) -> Vec<&str> {
    let mut colleges: Vec<&str> = mentors.iter().map(|m| m.college.as_str()).collect();
    colleges.sort_unstable();
    colleges.dedup();
    colleges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::mentor;
    use crate::catalog::Catalog;

    fn sample() -> Vec<Mentor> {
        let mut law = mentor(3, "Sneha", 4.6, 449, 18);
        law.college = "NLSIU Bangalore".to_string();
        law.expertise = vec!["CLAT Preparation".to_string()];
        law.specializations = vec!["CLAT".to_string()];

        let mut busy = mentor(4, "Rahul", 4.9, 699, 28);
        busy.is_available = false;

        vec![
            mentor(1, "Arjun", 4.8, 499, 45),
            mentor(2, "Vikash", 4.8, 399, 50),
            law,
            busy,
        ]
    }

    fn ids(found: &[&Mentor]) -> Vec<i64> {
        found.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_budget_tier_boundaries() {
        assert_eq!(BudgetTier::classify(400), BudgetTier::Low);
        assert_eq!(BudgetTier::classify(401), BudgetTier::Medium);
        assert_eq!(BudgetTier::classify(450), BudgetTier::Medium);
        assert_eq!(BudgetTier::classify(600), BudgetTier::Medium);
        assert_eq!(BudgetTier::classify(601), BudgetTier::High);
    }

    #[test]
    fn test_unknown_budget_tier_rejected() {
        assert!(matches!(
            "premium".parse::<BudgetTier>(),
            Err(AppError::Validation(_))
        ));
        assert_eq!("Medium".parse::<BudgetTier>().unwrap(), BudgetTier::Medium);
    }

    #[test]
    fn test_listing_hides_unavailable_by_default() {
        let mentors = sample();
        let out = filter_mentors(&mentors, MentorFilter::default());
        assert!(!ids(&out).contains(&4));

        let all = filter_mentors(
            &mentors,
            MentorFilter {
                available_only: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(ids(&all)[0], 4);
    }

    #[test]
    fn test_listing_sorted_by_rating_with_stable_ties() {
        let mentors = sample();
        let out = filter_mentors(&mentors, MentorFilter::default());
        assert_eq!(ids(&out), [1, 2, 3]);
    }

    #[test]
    fn test_listing_price_and_rating_bounds() {
        let mentors = sample();
        let out = filter_mentors(
            &mentors,
            MentorFilter {
                min_rating: Some(4.7),
                max_price: Some(450),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [2]);
    }

    #[test]
    fn test_listing_expertise_substring() {
        let mentors = sample();
        let out = filter_mentors(
            &mentors,
            MentorFilter {
                expertise: Some("clat".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [3]);
    }

    #[test]
    fn test_search_orders_by_rating_then_success() {
        let mentors = sample();
        let out = search_mentors(&mentors, &MentorSearch::default()).unwrap();
        assert_eq!(ids(&out), [4, 2, 1, 3]);
    }

    #[test]
    fn test_search_has_no_implicit_availability_filter() {
        let mentors = sample();
        let search = MentorSearch {
            budget_range: Some("high".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search_mentors(&mentors, &search).unwrap()), [4]);
    }

    #[test]
    fn test_search_by_exam_and_expertise_areas() {
        let mentors = sample();
        let search = MentorSearch {
            target_exam: Some("jee".into()),
            expertise_areas: vec!["preparation".into()],
            budget_range: Some("medium".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search_mentors(&mentors, &search).unwrap()), [1]);
    }

    #[test]
    fn test_embedded_mid_priced_mentor_is_medium() {
        let catalog = Catalog::embedded().unwrap();
        let sneha = catalog
            .mentors()
            .iter()
            .find(|m| m.pricing.per_session == 449)
            .unwrap();
        assert_eq!(BudgetTier::classify(sneha.pricing.per_session), BudgetTier::Medium);
    }

    #[test]
    fn test_distinct_categories_and_colleges() {
        let mentors = sample();
        assert_eq!(
            expertise_categories(&mentors),
            ["CLAT Preparation", "JEE Preparation"]
        );
        assert_eq!(mentor_colleges(&mentors), ["IIT Delhi", "NLSIU Bangalore"]);
    }
}
