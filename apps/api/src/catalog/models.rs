use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Open,
    Urgent,
    Expired,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Open => "open",
            ExamStatus::Urgent => "urgent",
            ExamStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub stream: String,
    pub level: String,
    pub application_deadline: NaiveDate,
    pub exam_date: NaiveDate,
    pub status: ExamStatus,
    /// Fees, subjects, tips and the rest of the descriptive metadata.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Published admission threshold for one exam/category pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cutoff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct College {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub location: String,
    pub state: String,
    pub category: String,
    #[serde(rename = "type")]
    pub college_type: String,
    /// Lower is better.
    pub nirf_ranking: u32,
    pub accepted_exams: Vec<String>,
    /// exam name → reservation category → cutoff
    pub cutoffs: BTreeMap<String, BTreeMap<String, Cutoff>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl College {
    pub fn accepts(&self, exam_name: &str) -> bool {
        self.accepted_exams.iter().any(|e| e == exam_name)
    }

    pub fn cutoff(&self, exam_name: &str, category: &str) -> Option<&Cutoff> {
        self.cutoffs.get(exam_name)?.get(category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub per_session: u32,
    pub package_5: u32,
    pub package_10: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub days: Vec<String>,
    pub time_slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    pub id: i64,
    pub name: String,
    pub college: String,
    pub location: String,
    pub rating: f64,
    pub pricing: Pricing,
    pub expertise: Vec<String>,
    pub specializations: Vec<String>,
    pub availability: Availability,
    pub is_available: bool,
    pub success_stories: u32,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub duration_days: i32,
    pub features: Vec<String>,
}

/// Plans whose id carries the `premium` prefix grant the premium entitlement.
pub fn grants_premium(plan_id: &str) -> bool {
    plan_id.starts_with("premium")
}
