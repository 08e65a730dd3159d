use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::catalog::models::Mentor;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::mentors::matching::{
    expertise_categories, filter_mentors, mentor_colleges, search_mentors, MentorFilter,
    MentorSearch,
};
use crate::mentors::schedule::{availability, quote_booking, BookingRequest};
use crate::state::AppState;

fn find_mentor(state: &AppState, id: i64) -> Result<&Mentor, AppError> {
    state
        .catalog
        .mentor(id)
        .ok_or_else(|| AppError::NotFound(format!("Mentor {id} not found")))
}

/// GET /api/mentors
pub async fn handle_list_mentors(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<MentorFilter>,
) -> Json<Value> {
    let mentors = filter_mentors(state.catalog.mentors(), filter);
    Json(json!({ "mentors": mentors, "total": mentors.len() }))
}

/// GET /api/mentors/:id
pub async fn handle_get_mentor(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let mentor = find_mentor(&state, id)?;
    Ok(Json(json!({ "mentor": mentor })))
}

/// POST /api/mentors/search
pub async fn handle_search_mentors(
    State(state): State<AppState>,
    AppJson(search): AppJson<MentorSearch>,
) -> Result<Json<Value>, AppError> {
    let mentors = search_mentors(state.catalog.mentors(), &search)?;
    Ok(Json(json!({
        "mentors": mentors,
        "total": mentors.len(),
        "search_criteria": search
    })))
}

/// GET /api/mentors/categories
pub async fn handle_mentor_categories(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": expertise_categories(state.catalog.mentors()) }))
}

/// GET /api/mentors/colleges
pub async fn handle_mentor_colleges(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "colleges": mentor_colleges(state.catalog.mentors()) }))
}

/// GET /api/mentors/:id/availability
pub async fn handle_mentor_availability(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let mentor = find_mentor(&state, id)?;
    let days = availability(mentor, Utc::now().date_naive());
    Ok(Json(json!({ "mentor_id": id, "availability": days })))
}

/// POST /api/mentors/:id/book
pub async fn handle_book_session(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mentor = find_mentor(&state, id)?;
    let booking = quote_booking(mentor, user.id, req, Utc::now())?;
    tracing::info!(
        "User {} requested {:?} with mentor {} ({})",
        user.id,
        booking.session_type,
        mentor.id,
        booking.id
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Session booking created successfully",
            "booking": booking,
            "payment_required": true
        })),
    ))
}
