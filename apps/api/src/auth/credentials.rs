//! Credential store: bcrypt digests, computed off the async executor.

use anyhow::Context;

use crate::errors::AppError;

pub async fn hash_password(password: String) -> Result<String, AppError> {
    hash_with_cost(password, bcrypt::DEFAULT_COST).await
}

async fn hash_with_cost(password: String, cost: u32) -> Result<String, AppError> {
    let digest = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")?;
    Ok(digest)
}

/// A malformed digest verifies as `false` rather than erroring.
pub async fn verify_password(password: String, digest: String) -> Result<bool, AppError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .context("Password verification task failed")?
        .unwrap_or(false);
    Ok(matches)
}
