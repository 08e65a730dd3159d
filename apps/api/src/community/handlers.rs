use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::community::repo::{self, QuestionQuery, VoteTarget};
use crate::community::scoring::{
    answer_rate, validate_answer, validate_question, QuestionSort, VoteDirection, POPULAR_TAGS,
    TOP_CONTRIBUTORS,
};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::query::PageRequest;
use crate::state::AppState;
use crate::users;

#[derive(Debug, Default, Deserialize)]
pub struct QuestionListParams {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskQuestionRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_type: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/community/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<QuestionListParams>,
    AppQuery(page): AppQuery<PageRequest>,
) -> Result<Json<Value>, AppError> {
    let query = QuestionQuery {
        category: non_blank(&params.category),
        tag: non_blank(&params.tag),
        search: non_blank(&params.search),
        sort: QuestionSort::parse(params.sort_by.as_deref()),
    };
    let (questions, info) = repo::list_questions(&state.db, &query, page).await?;
    Ok(Json(json!({
        "questions": questions,
        "total": info.total,
        "page": info.page,
        "per_page": info.per_page,
        "total_pages": info.total_pages
    })))
}

/// GET /api/community/questions/:id
pub async fn handle_get_question(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let (question, answers) = repo::view_question(&state.db, id).await?;
    Ok(Json(json!({ "question": question, "answers": answers })))
}

/// POST /api/community/questions
pub async fn handle_ask_question(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<AskQuestionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let question = validate_question(&req.title, &req.content, &req.category, &req.tags)?;
    let author = users::repo::require_user(&state.db, user.id).await?;
    let created = repo::create_question(&state.db, author.id, &question).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Question posted successfully",
            "question": created
        })),
    ))
}

/// POST /api/community/questions/:id/answers
pub async fn handle_post_answer(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(question_id): AppPath<i64>,
    AppJson(req): AppJson<AnswerRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let content = validate_answer(&req.content)?;
    let author = users::repo::require_user(&state.db, user.id).await?;
    let answer = repo::create_answer(&state.db, question_id, author.id, content).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Answer posted successfully",
            "answer": answer
        })),
    ))
}

async fn cast_vote(
    state: &AppState,
    target: VoteTarget,
    id: i64,
    req: VoteRequest,
) -> Result<Json<Value>, AppError> {
    let direction = VoteDirection::parse(req.vote_type.as_deref())?;
    let votes = repo::vote(&state.db, target, id, direction).await?;
    Ok(Json(json!({
        "message": format!("{} {}voted successfully", target.label(), direction.as_str()),
        "votes": votes
    })))
}

/// POST /api/community/questions/:id/vote
pub async fn handle_vote_question(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<VoteRequest>,
) -> Result<Json<Value>, AppError> {
    cast_vote(&state, VoteTarget::Question, id, req).await
}

/// POST /api/community/answers/:id/vote
pub async fn handle_vote_answer(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<VoteRequest>,
) -> Result<Json<Value>, AppError> {
    cast_vote(&state, VoteTarget::Answer, id, req).await
}

/// POST /api/community/questions/:question_id/best-answer/:answer_id
pub async fn handle_mark_best_answer(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((question_id, answer_id)): AppPath<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    repo::mark_best_answer(&state.db, user.id, question_id, answer_id).await?;
    Ok(Json(json!({
        "message": "Answer marked as best answer successfully"
    })))
}

/// GET /api/community/categories
pub async fn handle_categories(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let counts: BTreeMap<String, i64> = repo::category_counts(&state.db)
        .await?
        .into_iter()
        .collect();
    let categories: Vec<&String> = counts.keys().collect();
    Ok(Json(json!({ "categories": categories, "counts": counts })))
}

/// GET /api/community/tags
pub async fn handle_popular_tags(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tags = repo::popular_tags(&state.db, POPULAR_TAGS).await?;
    Ok(Json(json!({ "popular_tags": tags })))
}

/// GET /api/community/my-questions
pub async fn handle_my_questions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let questions = repo::questions_by(&state.db, user.id).await?;
    Ok(Json(json!({ "questions": questions, "total": questions.len() })))
}

/// GET /api/community/my-answers
pub async fn handle_my_answers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let answers = repo::answers_by(&state.db, user.id).await?;
    Ok(Json(json!({ "answers": answers, "total": answers.len() })))
}

/// GET /api/community/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let totals = repo::totals(&state.db).await?;
    let contributors = repo::top_contributors(&state.db, TOP_CONTRIBUTORS).await?;
    Ok(Json(json!({
        "total_questions": totals.total_questions,
        "total_answers": totals.total_answers,
        "answered_questions": totals.answered_questions,
        "answer_rate": answer_rate(totals.answered_questions, totals.total_questions),
        "top_contributors": contributors
    })))
}
