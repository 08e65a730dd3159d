use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::colleges::eligibility::{recommend_colleges, RecommendationRequest};
use crate::colleges::{
    category_counts, compare, filter_colleges, state_counts, CollegeFilter, COMPARISON_POINTS,
};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::profile::{self, MemberCollection};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub college_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct ShortlistRequest {
    pub college_id: i64,
}

/// GET /api/colleges
pub async fn handle_list_colleges(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<CollegeFilter>,
) -> Json<Value> {
    let colleges = filter_colleges(state.catalog.colleges(), filter);
    Json(json!({ "colleges": colleges, "total": colleges.len() }))
}

/// GET /api/colleges/:id
pub async fn handle_get_college(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let college = state
        .catalog
        .college(id)
        .ok_or_else(|| AppError::NotFound(format!("College {id} not found")))?;
    Ok(Json(json!({ "college": college })))
}

/// POST /api/colleges/recommendations
pub async fn handle_college_recommendations(
    State(state): State<AppState>,
    AppJson(req): AppJson<RecommendationRequest>,
) -> Result<Json<Value>, AppError> {
    let result = recommend_colleges(state.catalog.colleges(), &req)?;
    Ok(Json(json!(result)))
}

/// POST /api/colleges/compare
pub async fn handle_compare_colleges(
    State(state): State<AppState>,
    AppJson(req): AppJson<CompareRequest>,
) -> Result<Json<Value>, AppError> {
    let colleges = compare(state.catalog.colleges(), &req.college_ids)?;
    Ok(Json(json!({
        "colleges": colleges,
        "comparison_points": COMPARISON_POINTS
    })))
}

/// GET /api/colleges/categories
pub async fn handle_college_categories(State(state): State<AppState>) -> Json<Value> {
    let counts = category_counts(state.catalog.colleges());
    let categories: Vec<&String> = counts.keys().collect();
    Json(json!({ "categories": categories, "counts": counts }))
}

/// GET /api/colleges/states
pub async fn handle_college_states(State(state): State<AppState>) -> Json<Value> {
    let counts = state_counts(state.catalog.colleges());
    let states: Vec<&String> = counts.keys().collect();
    Json(json!({ "states": states, "counts": counts }))
}

/// POST /api/colleges/shortlist
pub async fn handle_add_to_shortlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ShortlistRequest>,
) -> Result<Json<Value>, AppError> {
    if state.catalog.college(req.college_id).is_none() {
        return Err(AppError::NotFound(format!(
            "College {} not found",
            req.college_id
        )));
    }
    let shortlisted = profile::add_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Shortlist,
        req.college_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "College added to shortlist",
        "shortlisted_colleges": shortlisted
    })))
}

/// GET /api/colleges/shortlist
pub async fn handle_get_shortlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let ids = profile::members(state.profiles.as_ref(), user.id, MemberCollection::Shortlist).await?;
    let colleges: Vec<_> = state
        .catalog
        .colleges()
        .iter()
        .filter(|c| ids.contains(&c.id))
        .collect();
    Ok(Json(json!({ "shortlisted_colleges": colleges, "total": colleges.len() })))
}

/// DELETE /api/colleges/shortlist/:id
pub async fn handle_remove_from_shortlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(college_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let shortlisted = profile::remove_member(
        state.profiles.as_ref(),
        user.id,
        MemberCollection::Shortlist,
        college_id,
    )
    .await?;
    Ok(Json(json!({
        "message": "College removed from shortlist",
        "shortlisted_colleges": shortlisted
    })))
}
