use chrono::Utc;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{UserProfileRow, UserRow};
use crate::users::premium;
use crate::users::{ProfileUpdate, UserUpdate};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub class_level: Option<&'a str>,
    pub stream: Option<&'a str>,
    pub target_exams: Option<&'a Value>,
    pub board: Option<&'a str>,
}

fn signup_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_username_key") => {
                return AppError::Conflict("Username already exists".to_string())
            }
            Some("users_email_key") => {
                return AppError::Conflict("Email already registered".to_string())
            }
            _ => {}
        }
    }
    AppError::conflict_on_unique(err, "Username or email already registered")
}

/// Inserts the user and its profile row in one transaction.
pub async fn create_with_profile(pool: &PgPool, new: NewUser<'_>) -> Result<UserRow, AppError> {
    let mut tx = pool.begin().await?;

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users
            (username, email, password_hash, full_name, phone, class_level, stream, target_exams)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(new.username)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.full_name)
    .bind(new.phone)
    .bind(new.class_level)
    .bind(new.stream)
    .bind(new.target_exams)
    .fetch_one(&mut *tx)
    .await
    .map_err(signup_conflict)?;

    let preferred_streams = new.stream.map(|s| Value::from(vec![s]));
    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id, current_class, board, preferred_streams)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user.id)
    .bind(new.class_level)
    .bind(new.board)
    .bind(preferred_streams)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Created user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Looks a user up by username or email.
pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $1 LIMIT 1")
        .bind(login)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Loads a user, clearing a premium flag whose expiry has passed.
pub async fn require_user(pool: &PgPool, id: i64) -> Result<UserRow, AppError> {
    let user = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    correct_stale_premium(pool, user).await
}

pub async fn correct_stale_premium(pool: &PgPool, mut user: UserRow) -> Result<UserRow, AppError> {
    if !premium::is_stale(user.is_premium, user.premium_expires, Utc::now()) {
        return Ok(user);
    }
    sqlx::query(
        r#"
        UPDATE users SET is_premium = FALSE, updated_at = NOW()
        WHERE id = $1 AND is_premium AND (premium_expires IS NULL OR premium_expires <= NOW())
        "#,
    )
    .bind(user.id)
    .execute(pool)
    .await?;
    info!("Cleared expired premium flag for user {}", user.id);
    user.is_premium = false;
    Ok(user)
}

pub async fn record_login(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_fields(
    conn: &mut PgConnection,
    id: i64,
    update: &UserUpdate,
) -> Result<UserRow, AppError> {
    let user: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users SET
            full_name    = COALESCE($2, full_name),
            phone        = COALESCE($3, phone),
            class_level  = COALESCE($4, class_level),
            stream       = COALESCE($5, stream),
            target_exams = COALESCE($6, target_exams),
            updated_at   = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.full_name.as_deref())
    .bind(update.phone.as_deref())
    .bind(update.class_level.as_deref())
    .bind(update.stream.as_deref())
    .bind(update.target_exams.as_ref())
    .fetch_optional(conn)
    .await?;
    user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Creates the profile if needed and applies the supplied attributes. Bumps
/// the row version so in-flight collection writes re-read.
pub async fn upsert_profile_fields(
    conn: &mut PgConnection,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<UserProfileRow, AppError> {
    let profile = sqlx::query_as(
        r#"
        INSERT INTO user_profiles
            (user_id, current_class, school_name, board, budget_range,
             target_colleges, preferred_streams, preferred_cities)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id) DO UPDATE SET
            current_class     = COALESCE(EXCLUDED.current_class, user_profiles.current_class),
            school_name       = COALESCE(EXCLUDED.school_name, user_profiles.school_name),
            board             = COALESCE(EXCLUDED.board, user_profiles.board),
            budget_range      = COALESCE(EXCLUDED.budget_range, user_profiles.budget_range),
            target_colleges   = COALESCE(EXCLUDED.target_colleges, user_profiles.target_colleges),
            preferred_streams = COALESCE(EXCLUDED.preferred_streams, user_profiles.preferred_streams),
            preferred_cities  = COALESCE(EXCLUDED.preferred_cities, user_profiles.preferred_cities),
            version           = user_profiles.version + 1,
            updated_at        = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(update.current_class.as_deref())
    .bind(update.school_name.as_deref())
    .bind(update.board.as_deref())
    .bind(update.budget_range.as_deref())
    .bind(update.target_colleges.as_ref())
    .bind(update.preferred_streams.as_ref())
    .bind(update.preferred_cities.as_ref())
    .fetch_one(conn)
    .await?;
    Ok(profile)
}

pub async fn find_profile(pool: &PgPool, user_id: i64) -> Result<Option<UserProfileRow>, AppError> {
    let profile = sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

pub async fn set_password_hash(pool: &PgPool, id: i64, hash: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes the account; profile and payments go with it via `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
