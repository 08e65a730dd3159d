//! Read-only exam, college, mentor and plan collections.
//!
//! Loaded once at startup (embedded JSON, or `CATALOG_DIR` when configured),
//! validated, then shared behind an `Arc` with no locking.

pub mod models;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tracing::info;

use self::models::{College, Exam, Mentor, PaymentPlan};

const EXAMS_JSON: &str = include_str!("../../data/exams.json");
const COLLEGES_JSON: &str = include_str!("../../data/colleges.json");
const MENTORS_JSON: &str = include_str!("../../data/mentors.json");
const PLANS_JSON: &str = include_str!("../../data/plans.json");

#[derive(Debug, Clone)]
pub struct Catalog {
    exams: Vec<Exam>,
    colleges: Vec<College>,
    mentors: Vec<Mentor>,
    plans: BTreeMap<String, PaymentPlan>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_sources(EXAMS_JSON, COLLEGES_JSON, MENTORS_JSON, PLANS_JSON)
    }

    /// Reads the four catalog files from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read catalog file {}", path.display()))
        };
        Self::from_sources(
            &read("exams.json")?,
            &read("colleges.json")?,
            &read("mentors.json")?,
            &read("plans.json")?,
        )
    }

    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let catalog = match dir {
            Some(dir) => Self::from_dir(dir)?,
            None => Self::embedded()?,
        };
        info!(
            "Catalog loaded: {} exams, {} colleges, {} mentors, {} plans",
            catalog.exams.len(),
            catalog.colleges.len(),
            catalog.mentors.len(),
            catalog.plans.len()
        );
        Ok(catalog)
    }

    fn from_sources(exams: &str, colleges: &str, mentors: &str, plans: &str) -> Result<Self> {
        Self::new(
            parse("exams", exams)?,
            parse("colleges", colleges)?,
            parse("mentors", mentors)?,
            parse("plans", plans)?,
        )
    }

    /// Builds a catalog after checking id uniqueness and that every college
    /// only publishes cutoffs for exams it accepts.
    pub fn new(
        exams: Vec<Exam>,
        colleges: Vec<College>,
        mentors: Vec<Mentor>,
        plans: BTreeMap<String, PaymentPlan>,
    ) -> Result<Self> {
        ensure_unique_ids("exam", exams.iter().map(|e| e.id))?;
        ensure_unique_ids("college", colleges.iter().map(|c| c.id))?;
        ensure_unique_ids("mentor", mentors.iter().map(|m| m.id))?;

        for college in &colleges {
            if let Some(exam) = college.cutoffs.keys().find(|exam| !college.accepts(exam)) {
                bail!(
                    "College {} publishes cutoffs for '{}' which it does not accept",
                    college.id,
                    exam
                );
            }
        }

        Ok(Self {
            exams,
            colleges,
            mentors,
            plans,
        })
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn exam(&self, id: i64) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == id)
    }

    pub fn colleges(&self) -> &[College] {
        &self.colleges
    }

    pub fn college(&self, id: i64) -> Option<&College> {
        self.colleges.iter().find(|c| c.id == id)
    }

    pub fn mentors(&self) -> &[Mentor] {
        &self.mentors
    }

    pub fn mentor(&self, id: i64) -> Option<&Mentor> {
        self.mentors.iter().find(|m| m.id == id)
    }

    pub fn plans(&self) -> &BTreeMap<String, PaymentPlan> {
        &self.plans
    }

    pub fn plan(&self, id: &str) -> Option<&PaymentPlan> {
        self.plans.get(id)
    }
}

fn parse<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("Failed to parse {what} catalog"))
}

fn ensure_unique_ids(kind: &str, ids: impl Iterator<Item = i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("Duplicate {kind} id {id} in catalog");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built records shared by the engine tests.

    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use serde_json::Map;

    use super::models::*;

    pub fn exam(id: i64, name: &str, stream: &str, level: &str, status: ExamStatus) -> Exam {
        Exam {
            id,
            name: name.to_string(),
            full_name: format!("{name} Examination"),
            stream: stream.to_string(),
            level: level.to_string(),
            application_deadline: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            exam_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            status,
            details: Map::new(),
        }
    }

    pub fn college(id: i64, name: &str, state: &str, category: &str, ranking: u32) -> College {
        College {
            id,
            name: name.to_string(),
            full_name: format!("{name} Institute"),
            location: format!("Campus, {state}"),
            state: state.to_string(),
            category: category.to_string(),
            college_type: "Government".to_string(),
            nirf_ranking: ranking,
            accepted_exams: Vec::new(),
            cutoffs: BTreeMap::new(),
            details: Map::new(),
        }
    }

    pub fn with_cutoff(
        mut college: College,
        exam: &str,
        category: &str,
        rank: Option<u32>,
        percentile: Option<f64>,
    ) -> College {
        if !college.accepts(exam) {
            college.accepted_exams.push(exam.to_string());
        }
        college
            .cutoffs
            .entry(exam.to_string())
            .or_default()
            .insert(category.to_string(), Cutoff { rank, percentile });
        college
    }

    pub fn mentor(id: i64, name: &str, rating: f64, per_session: u32, success: u32) -> Mentor {
        Mentor {
            id,
            name: name.to_string(),
            college: "IIT Delhi".to_string(),
            location: "Delhi".to_string(),
            rating,
            pricing: Pricing {
                per_session,
                package_5: per_session * 9 / 2,
                package_10: per_session * 8,
            },
            expertise: vec!["JEE Preparation".to_string()],
            specializations: vec!["JEE Main".to_string()],
            availability: Availability {
                days: vec!["Monday".to_string()],
                time_slots: vec!["10:00-12:00".to_string()],
            },
            is_available: true,
            success_stories: success,
            details: Map::new(),
        }
    }
}
