use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub author_id: Option<i64>,
    /// Joined from `users`; `None` once the author account is deleted.
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub votes: i64,
    pub answers_count: i32,
    pub views: i64,
    pub is_answered: bool,
    pub best_answer_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub content: String,
    pub votes: i64,
    pub is_best_answer: bool,
    pub is_helpful: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An answer listed under its author, with the title of the question it answers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthoredAnswerRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub answer: AnswerRow,
    pub question_title: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContributorRow {
    pub user_id: i64,
    pub username: String,
    /// Questions plus answers posted.
    pub contributions: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct CommunityTotals {
    pub total_questions: i64,
    pub total_answers: i64,
    pub answered_questions: i64,
}
