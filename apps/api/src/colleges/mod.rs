pub mod eligibility;
pub mod handlers;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::models::College;
use crate::errors::AppError;
use crate::query::filter::{any_field_contains, eq_ignore_case, present, within};
use crate::query::{facet_counts, Query};

pub const COMPARISON_POINTS: [&str; 6] = [
    "NIRF Ranking",
    "Annual Fees",
    "Average Placement Package",
    "Placement Rate",
    "Established Year",
    "Location",
];

#[derive(Debug, Default, Deserialize)]
pub struct CollegeFilter {
    pub category: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub college_type: Option<String>,
    pub search: Option<String>,
    pub min_ranking: Option<u32>,
    pub max_ranking: Option<u32>,
}

pub fn filter_colleges<'a>(colleges: &'a [College], filter: CollegeFilter) -> Vec<&'a College> {
    let ranking_bounds = (filter.min_ranking.is_some() || filter.max_ranking.is_some())
        .then_some((filter.min_ranking, filter.max_ranking));

    Query::new()
        .filter_by(present(filter.category), |c: &College, v| {
            eq_ignore_case(&c.category, v)
        })
        .filter_by(present(filter.state), |c: &College, v| eq_ignore_case(&c.state, v))
        .filter_by(present(filter.college_type), |c: &College, v| {
            eq_ignore_case(&c.college_type, v)
        })
        .filter_by(present(filter.search), |c: &College, term| {
            any_field_contains(&[&c.name, &c.full_name, &c.location], term)
        })
        .filter_by(ranking_bounds, |c: &College, (min, max)| {
            within(c.nirf_ranking, *min, *max)
        })
        .run(colleges)
}

/// Resolves the requested ids, skipping unknown ones. At least two must resolve.
pub fn compare<'a>(colleges: &'a [College], ids: &[i64]) -> Result<Vec<&'a College>, AppError> {
    if ids.len() < 2 {
        return Err(AppError::Validation(
            "At least 2 college IDs are required for comparison".into(),
        ));
    }
    let found: Vec<&College> = ids
        .iter()
        .filter_map(|id| colleges.iter().find(|c| c.id == *id))
        .collect();
    if found.len() < 2 {
        return Err(AppError::Validation(
            "Not enough valid colleges found for comparison".into(),
        ));
    }
    Ok(found)
}

pub fn category_counts(colleges: &[College]) -> BTreeMap<String, usize> {
    facet_counts(colleges.iter().map(|c| c.category.as_str()))
}

pub fn state_counts(colleges: &[College]) -> BTreeMap<String, usize> {
    facet_counts(colleges.iter().map(|c| c.state.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::college;

    fn sample() -> Vec<College> {
        let mut private = college(4, "BITS Pilani", "Rajasthan", "Engineering", 25);
        private.college_type = "Private".to_string();
        vec![
            college(1, "IIT Delhi", "Delhi", "Engineering", 2),
            college(2, "AIIMS Delhi", "Delhi", "Medical", 1),
            college(3, "NIT Trichy", "Tamil Nadu", "Engineering", 9),
            private,
        ]
    }

    fn ids(found: &[&College]) -> Vec<i64> {
        found.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_filter_state_and_category_ignore_case() {
        let colleges = sample();
        let out = filter_colleges(
            &colleges,
            CollegeFilter {
                state: Some("delhi".into()),
                category: Some("ENGINEERING".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [1]);
    }

    #[test]
    fn test_filter_by_type() {
        let colleges = sample();
        let out = filter_colleges(
            &colleges,
            CollegeFilter {
                college_type: Some("private".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [4]);
    }

    #[test]
    fn test_ranking_range_is_inclusive() {
        let colleges = sample();
        let out = filter_colleges(
            &colleges,
            CollegeFilter {
                min_ranking: Some(2),
                max_ranking: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [1, 3]);
    }

    #[test]
    fn test_search_matches_location() {
        let colleges = sample();
        let out = filter_colleges(
            &colleges,
            CollegeFilter {
                search: Some("campus, tamil".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [3]);
    }

    #[test]
    fn test_compare_skips_unknown_ids() {
        let colleges = sample();
        let out = compare(&colleges, &[3, 99, 1]).unwrap();
        assert_eq!(ids(&out), [3, 1]);
    }

    #[test]
    fn test_compare_needs_two_resolved() {
        let colleges = sample();
        assert!(matches!(compare(&colleges, &[1]), Err(AppError::Validation(_))));
        assert!(matches!(
            compare(&colleges, &[1, 99]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_facets() {
        let colleges = sample();
        assert_eq!(category_counts(&colleges)["Engineering"], 3);
        let states: Vec<_> = state_counts(&colleges).into_keys().collect();
        assert_eq!(states, ["Delhi", "Rajasthan", "Tamil Nadu"]);
    }
}
