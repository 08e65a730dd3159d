use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::profile::{self, MemberCollection};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ShortlistIdRequest {
    pub college_id: i64,
}

#[derive(Deserialize)]
pub struct ExamScoreRequest {
    pub exam_name: Option<String>,
    #[serde(default)]
    pub score_data: Value,
}

/// GET /api/shortlist
pub async fn handle_get_shortlist_ids(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let ids = profile::members(state.profiles.as_ref(), user.id, MemberCollection::Shortlist).await?;
    Ok(Json(json!({ "shortlisted_colleges": ids })))
}

/// POST /api/shortlist
///
/// Unlike `/api/colleges/shortlist` this accepts any id without a catalog check.
pub async fn handle_add_shortlist_id(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ShortlistIdRequest>,
) -> Result<Json<Value>, AppError> {
    let ids = profile::add_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Shortlist,
        req.college_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "College added to shortlist",
        "shortlisted_colleges": ids
    })))
}

/// DELETE /api/shortlist
pub async fn handle_remove_shortlist_id(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ShortlistIdRequest>,
) -> Result<Json<Value>, AppError> {
    let ids = profile::remove_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Shortlist,
        req.college_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "College removed from shortlist",
        "shortlisted_colleges": ids
    })))
}

/// POST /api/exam-scores
pub async fn handle_save_exam_score(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ExamScoreRequest>,
) -> Result<Json<Value>, AppError> {
    let exam_name = req
        .exam_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation("Exam name and score data are required".into()))?;
    if req.score_data.is_null() {
        return Err(AppError::Validation(
            "Exam name and score data are required".into(),
        ));
    }

    let scores =
        profile::set_exam_score(state.profiles.as_ref(), user.id, exam_name, req.score_data.clone())
            .await?;
    Ok(Json(json!({
        "message": "Exam scores saved successfully",
        "exam_scores": scores
    })))
}

/// GET /api/exam-scores
pub async fn handle_get_exam_scores(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let scores = profile::exam_scores(state.profiles.as_ref(), user.id).await?;
    Ok(Json(json!({ "exam_scores": scores })))
}
