use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::exams::{deadlines, filter_exams, recommend, stream_counts, upcoming, ExamFilter};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::profile::{self, MemberCollection};
use crate::state::AppState;
use crate::users;

#[derive(Deserialize)]
pub struct BookmarkRequest {
    pub exam_id: i64,
}

/// GET /api/exams
pub async fn handle_list_exams(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ExamFilter>,
) -> Json<Value> {
    let exams = filter_exams(state.catalog.exams(), filter);
    Json(json!({ "exams": exams, "total": exams.len() }))
}

/// GET /api/exams/:id
pub async fn handle_get_exam(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let exam = state
        .catalog
        .exam(id)
        .ok_or_else(|| AppError::NotFound(format!("Exam {id} not found")))?;
    Ok(Json(json!({ "exam": exam })))
}

/// GET /api/exams/streams
pub async fn handle_exam_streams(State(state): State<AppState>) -> Json<Value> {
    let counts = stream_counts(state.catalog.exams());
    let streams: Vec<&String> = counts.keys().collect();
    Json(json!({ "streams": streams, "counts": counts }))
}

/// GET /api/exams/upcoming
pub async fn handle_upcoming_exams(State(state): State<AppState>) -> Json<Value> {
    let exams = upcoming(state.catalog.exams(), Utc::now().date_naive());
    Json(json!({ "upcoming_exams": exams, "total": exams.len() }))
}

/// GET /api/exams/deadlines
pub async fn handle_exam_deadlines(State(state): State<AppState>) -> Json<Value> {
    let exams = deadlines(state.catalog.exams(), Utc::now().date_naive());
    Json(json!({ "deadline_exams": exams, "total": exams.len() }))
}

/// POST /api/exams/bookmark
pub async fn handle_add_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<BookmarkRequest>,
) -> Result<Json<Value>, AppError> {
    if state.catalog.exam(req.exam_id).is_none() {
        return Err(AppError::NotFound(format!("Exam {} not found", req.exam_id)));
    }
    let bookmarked = profile::add_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Bookmarks,
        req.exam_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "Exam bookmarked successfully",
        "bookmarked_exams": bookmarked
    })))
}

/// DELETE /api/exams/bookmark
pub async fn handle_remove_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<BookmarkRequest>,
) -> Result<Json<Value>, AppError> {
    let bookmarked = profile::remove_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Bookmarks,
        req.exam_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "Exam bookmark removed",
        "bookmarked_exams": bookmarked
    })))
}

/// GET /api/exams/bookmarks
pub async fn handle_list_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let ids = profile::members(state.profiles.as_ref(), user.id, MemberCollection::Bookmarks).await?;
    let exams: Vec<_> = state
        .catalog
        .exams()
        .iter()
        .filter(|e| ids.contains(&e.id))
        .collect();
    Ok(Json(json!({ "bookmarked_exams": exams, "total": exams.len() })))
}

/// GET /api/exams/recommendations
pub async fn handle_exam_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let account = users::repo::require_user(&state.db, user.id).await?;
    let exams = recommend(
        state.catalog.exams(),
        account.stream.as_deref(),
        account.class_level.as_deref(),
    );
    Ok(Json(json!({
        "recommended_exams": exams,
        "total": exams.len(),
        "reason": "Based on your profile preferences"
    })))
}
