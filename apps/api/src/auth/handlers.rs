use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::credentials::{hash_password, verify_password};
use crate::auth::validation::{validate_email_format, validate_password_strength};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::users::{repo, ProfileUpdate, UserUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 80, message = "username is required"))]
    pub username: String,
    #[validate(custom = "validate_email_format")]
    pub email: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "full_name is required"))]
    pub full_name: String,
    #[validate(length(max = 15, message = "phone must be at most 15 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 20, message = "class_level must be at most 20 characters"))]
    pub class_level: Option<String>,
    #[validate(length(max = 50, message = "stream must be at most 50 characters"))]
    pub stream: Option<String>,
    pub target_exams: Option<Value>,
    pub board: Option<String>,
}

impl SignupRequest {
    /// Trims the identity fields so the length rules see what gets stored.
    fn trimmed(mut self) -> Self {
        for field in [&mut self.username, &mut self.email, &mut self.full_name] {
            *field = field.trim().to_string();
        }
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    #[validate(custom = "validate_password_strength")]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(flatten)]
    pub user: UserUpdate,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

fn session_body(state: &AppState, message: &str, user: &UserRow) -> Result<Value, AppError> {
    let token = state.tokens.issue(user.id, &user.username)?;
    Ok(json!({
        "message": message,
        "user": user,
        "token": token,
        "token_type": "Bearer",
        "expires_in": state.tokens.ttl_secs()
    }))
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let req = req.trimmed();
    req.validate()?;

    let digest = hash_password(req.password.clone()).await?;
    let user = repo::create_with_profile(
        &state.db,
        repo::NewUser {
            username: &req.username,
            email: &req.email,
            password_hash: &digest,
            full_name: &req.full_name,
            phone: req.phone.as_deref(),
            class_level: req.class_level.as_deref(),
            stream: req.stream.as_deref(),
            target_exams: req.target_exams.as_ref(),
            board: req.board.as_deref(),
        },
    )
    .await?;

    let body = session_body(&state, "User created successfully", &user)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let login = req.username.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = repo::find_by_login(&state.db, login).await?.ok_or_else(invalid)?;
    if !verify_password(req.password, user.password_hash.clone()).await? {
        warn!("Failed login for {}", user.username);
        return Err(invalid());
    }

    repo::record_login(&state.db, user.id).await?;
    let user = repo::require_user(&state.db, user.id).await?;
    info!("User {} logged in", user.id);
    Ok(Json(session_body(&state, "Login successful", &user)?))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn handle_logout() -> Json<Value> {
    Json(json!({ "message": "Logout successful" }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let account = repo::require_user(&state.db, user.id).await?;
    Ok(Json(json!({ "user": account })))
}

/// GET /api/auth/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let account = repo::require_user(&state.db, user.id).await?;
    let profile = repo::find_profile(&state.db, user.id).await?;
    Ok(Json(json!({ "user": account, "profile": profile })))
}

/// PUT /api/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ProfileUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    req.user.validate()?;
    req.profile.validate()?;

    let mut tx = state.db.begin().await?;
    let account = repo::update_fields(&mut *tx, user.id, &req.user).await?;
    let profile = repo::upsert_profile_fields(&mut *tx, user.id, &req.profile).await?;
    tx.commit().await?;

    let account = repo::correct_stale_premium(&state.db, account).await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": account,
        "profile": profile
    })))
}

/// POST /api/auth/change-password
pub async fn handle_change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::Validation(
            "Current password and new password are required".to_string(),
        ));
    }

    let account = repo::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if !verify_password(req.current_password.clone(), account.password_hash).await? {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    req.validate()?;

    let digest = hash_password(req.new_password).await?;
    repo::set_password_hash(&state.db, user.id, &digest).await?;
    info!("User {} changed password", user.id);
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str) -> SignupRequest {
        serde_json::from_value(json!({
            "username": "asha",
            "email": email,
            "password": password,
            "full_name": "Asha Rao"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(signup("asha@example.in", "Secret123").validate().is_ok());
    }

    #[test]
    fn test_signup_reports_each_bad_field() {
        let err: AppError = signup("asha@", "short").validate().unwrap_err().into();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("Invalid email format"));
                assert!(msg.contains("at least 8 characters"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_only_names_fail_validation() {
        let req: SignupRequest = serde_json::from_value(json!({
            "username": "   ",
            "email": "asha@example.in",
            "password": "Secret123",
            "full_name": "\t "
        }))
        .unwrap();
        let err: AppError = req.trimmed().validate().unwrap_err().into();
        match err {
            AppError::Validation(msg) => {
                assert_eq!(msg, "full_name is required; username is required")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_signup_fields_are_trimmed_before_storage() {
        let req: SignupRequest = serde_json::from_value::<SignupRequest>(json!({
            "username": "  asha ",
            "email": " asha@example.in ",
            "password": "Secret123",
            "full_name": " Asha Rao "
        }))
        .unwrap()
        .trimmed();
        assert!(req.validate().is_ok());
        assert_eq!(req.username, "asha");
        assert_eq!(req.email, "asha@example.in");
        assert_eq!(req.full_name, "Asha Rao");
    }

    #[test]
    fn test_missing_required_field_is_rejected_at_decode() {
        let parsed: Result<SignupRequest, _> =
            serde_json::from_value(json!({ "username": "asha", "email": "a@b.co" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_profile_update_splits_user_and_profile_fields() {
        let req: ProfileUpdateRequest = serde_json::from_value(json!({
            "full_name": "Asha R",
            "board": "CBSE",
            "preferred_cities": ["Pune"]
        }))
        .unwrap();
        assert_eq!(req.user.full_name.as_deref(), Some("Asha R"));
        assert_eq!(req.profile.board.as_deref(), Some("CBSE"));
        assert_eq!(req.profile.preferred_cities, Some(json!(["Pune"])));
    }
}
