use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub class_level: Option<String>,
    pub stream: Option<String>,
    pub target_exams: Option<Value>,
    pub is_verified: bool,
    /// Raw column. Callers go through `users::premium` for the effective state.
    pub is_premium: bool,
    pub premium_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfileRow {
    pub id: i64,
    pub user_id: i64,
    pub current_class: Option<String>,
    pub school_name: Option<String>,
    pub board: Option<String>,
    pub budget_range: Option<String>,
    pub bookmarked_exams: Option<Value>,
    pub shortlisted_colleges: Option<Value>,
    pub target_colleges: Option<Value>,
    pub preferred_streams: Option<Value>,
    pub preferred_cities: Option<Value>,
    pub exam_scores: Option<Value>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
