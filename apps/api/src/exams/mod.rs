//! Exam listing, calendar views and profile-based recommendations.

pub mod handlers;

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::models::Exam;
use crate::query::filter::{any_field_contains, eq_ignore_case, present};
use crate::query::{facet_counts, Query};

/// Deadlines further out than this are not reported.
pub const DEADLINE_WINDOW_DAYS: i64 = 30;
/// Number of catalog exams shown when a profile matches nothing.
pub const FALLBACK_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ExamFilter {
    pub stream: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

pub fn filter_exams<'a>(exams: &'a [Exam], filter: ExamFilter) -> Vec<&'a Exam> {
    Query::new()
        .filter_by(present(filter.stream), |e: &Exam, s| eq_ignore_case(&e.stream, s))
        .filter_by(present(filter.level), |e: &Exam, l| eq_ignore_case(&e.level, l))
        .filter_by(present(filter.status), |e: &Exam, s| {
            eq_ignore_case(e.status.as_str(), s)
        })
        .filter_by(present(filter.search), |e: &Exam, term| {
            any_field_contains(&[&e.name, &e.full_name, &e.stream], term)
        })
        .run(exams)
}

pub fn stream_counts(exams: &[Exam]) -> BTreeMap<String, usize> {
    facet_counts(exams.iter().map(|e| e.stream.as_str()))
}

#[derive(Debug, Serialize)]
pub struct UpcomingExam<'a> {
    #[serde(flatten)]
    pub exam: &'a Exam,
    pub days_remaining: i64,
}

/// Exams on or after `today`, soonest first.
pub fn upcoming(exams: &[Exam], today: NaiveDate) -> Vec<UpcomingExam<'_>> {
    let mut out: Vec<_> = exams
        .iter()
        .filter(|e| e.exam_date >= today)
        .map(|exam| UpcomingExam {
            exam,
            days_remaining: (exam.exam_date - today).num_days(),
        })
        .collect();
    out.sort_by_key(|u| u.exam.exam_date);
    out
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Moderate,
    Normal,
}

impl Urgency {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 7 => Urgency::Urgent,
            d if d <= 15 => Urgency::Moderate,
            _ => Urgency::Normal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeadlineExam<'a> {
    #[serde(flatten)]
    pub exam: &'a Exam,
    pub deadline_days_remaining: i64,
    pub urgency: Urgency,
}

/// Application deadlines falling within `[today, today + 30 days]`, nearest first.
pub fn deadlines(exams: &[Exam], today: NaiveDate) -> Vec<DeadlineExam<'_>> {
    let mut out: Vec<_> = exams
        .iter()
        .filter_map(|exam| {
            let days = (exam.application_deadline - today).num_days();
            (0..=DEADLINE_WINDOW_DAYS).contains(&days).then(|| DeadlineExam {
                exam,
                deadline_days_remaining: days,
                urgency: Urgency::from_days(days),
            })
        })
        .collect();
    out.sort_by_key(|d| d.exam.application_deadline);
    out
}

fn level_for_class(class_level: &str) -> Option<&'static str> {
    if class_level == "12th" || class_level == "Class 12" {
        Some("Undergraduate")
    } else if class_level.to_lowercase().contains("graduate") {
        Some("Postgraduate")
    } else {
        None
    }
}

/// Stream matches first, then exams at the level implied by the class, with
/// duplicates dropped. Falls back to the head of the catalog.
pub fn recommend<'a>(
    exams: &'a [Exam],
    stream: Option<&str>,
    class_level: Option<&str>,
) -> Vec<&'a Exam> {
    let by_stream = stream
        .into_iter()
        .flat_map(|s| exams.iter().filter(move |e| eq_ignore_case(&e.stream, s)));
    let by_level = class_level
        .and_then(level_for_class)
        .into_iter()
        .flat_map(|level| exams.iter().filter(move |e| e.level == level));

    let mut seen = HashSet::new();
    let picked: Vec<&Exam> = by_stream
        .chain(by_level)
        .filter(|e| seen.insert(e.id))
        .collect();

    if picked.is_empty() {
        exams.iter().take(FALLBACK_RECOMMENDATIONS).collect()
    } else {
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::catalog::models::ExamStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Exam> {
        vec![
            fixtures::exam(1, "JEE Main", "Engineering", "Undergraduate", ExamStatus::Open),
            fixtures::exam(2, "NEET UG", "Medical", "Undergraduate", ExamStatus::Urgent),
            fixtures::exam(3, "CAT", "Management", "Postgraduate", ExamStatus::Open),
            fixtures::exam(4, "BITSAT", "Engineering", "Undergraduate", ExamStatus::Expired),
        ]
    }

    fn ids(exams: &[&Exam]) -> Vec<i64> {
        exams.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_filter_by_stream_and_status() {
        let exams = sample();
        let out = filter_exams(
            &exams,
            ExamFilter {
                stream: Some("engineering".into()),
                status: Some("OPEN".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [1]);
    }

    #[test]
    fn test_search_covers_full_name() {
        let exams = sample();
        let out = filter_exams(
            &exams,
            ExamFilter {
                search: Some("neet ug exam".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), [2]);
    }

    #[test]
    fn test_stream_counts() {
        let counts = stream_counts(&sample());
        assert_eq!(counts["Engineering"], 2);
        assert_eq!(counts["Management"], 1);
    }

    #[test]
    fn test_upcoming_sorted_with_days_remaining() {
        let mut exams = sample();
        exams[0].exam_date = date(2025, 5, 10);
        exams[1].exam_date = date(2025, 5, 1);
        exams[2].exam_date = date(2025, 3, 1);
        exams[3].exam_date = date(2025, 4, 1);

        let out = upcoming(&exams, date(2025, 4, 1));
        let summary: Vec<_> = out.iter().map(|u| (u.exam.id, u.days_remaining)).collect();
        assert_eq!(summary, [(4, 0), (2, 30), (1, 39)]);
    }

    #[test]
    fn test_deadline_window_and_urgency() {
        let today = date(2025, 1, 1);
        let mut exams = sample();
        exams[0].application_deadline = date(2025, 1, 8); // 7 days
        exams[1].application_deadline = date(2025, 1, 16); // 15 days
        exams[2].application_deadline = date(2025, 1, 31); // 30 days
        exams[3].application_deadline = date(2025, 2, 1); // 31 days

        let out = deadlines(&exams, today);
        let summary: Vec<_> = out.iter().map(|d| (d.exam.id, d.urgency)).collect();
        assert_eq!(
            summary,
            [(1, Urgency::Urgent), (2, Urgency::Moderate), (3, Urgency::Normal)]
        );
    }

    #[test]
    fn test_past_deadline_is_excluded() {
        let mut exams = sample();
        for e in &mut exams {
            e.application_deadline = date(2024, 12, 31);
        }
        assert!(deadlines(&exams, date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn test_recommend_stream_then_level_without_duplicates() {
        let exams = sample();
        let out = recommend(&exams, Some("Engineering"), Some("12th"));
        assert_eq!(ids(&out), [1, 4, 2]);
    }

    #[test]
    fn test_recommend_graduate_gets_postgraduate_exams() {
        let exams = sample();
        let out = recommend(&exams, None, Some("Graduate"));
        assert_eq!(ids(&out), [3]);
    }

    #[test]
    fn test_recommend_falls_back_to_catalog_head() {
        let exams = sample();
        let out = recommend(&exams, Some("Law"), Some("10th"));
        assert_eq!(ids(&out), [1, 2, 3, 4]);
    }
}
