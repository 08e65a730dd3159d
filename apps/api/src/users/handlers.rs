use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;
use crate::users::{repo, UserUpdate};

/// GET /api/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    user.ensure_owner(id)?;
    let account = repo::require_user(&state.db, id).await?;
    let profile = repo::find_profile(&state.db, id).await?;
    Ok(Json(json!({ "user": account, "profile": profile })))
}

/// PUT /api/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(update): AppJson<UserUpdate>,
) -> Result<Json<Value>, AppError> {
    user.ensure_owner(id)?;
    update.validate()?;
    let mut conn = state.db.acquire().await?;
    let account = repo::update_fields(&mut conn, id, &update).await?;
    let account = repo::correct_stale_premium(&state.db, account).await?;
    Ok(Json(json!(account)))
}

/// DELETE /api/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    user.ensure_owner(id)?;
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    info!("Deleted account {id}");
    Ok(Json(json!({ "message": "Account deleted successfully" })))
}
