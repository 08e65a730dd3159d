//! Payment rows. Every transition locks the payment row (and the user row
//! when the entitlement changes) inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::auth::AuthUser;
use crate::catalog::models::{grants_premium, PaymentPlan};
use crate::errors::AppError;
use crate::models::payment::PaymentRow;
use crate::models::user::UserRow;
use crate::payments::state_machine::{check_refund, settle, PaymentStatus, Settlement};
use crate::users::premium;

fn payment_not_found() -> AppError {
    AppError::NotFound("Payment not found".to_string())
}

pub async fn create(
    pool: &PgPool,
    user_id: i64,
    plan_id: &str,
    plan: &PaymentPlan,
    payment_method: &str,
    transaction_id: &str,
) -> Result<PaymentRow, AppError> {
    let payment: PaymentRow = sqlx::query_as(
        r#"
        INSERT INTO payments
            (user_id, amount, currency, payment_method, status, transaction_id,
             service_type, service_duration)
        VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan.amount)
    .bind(&plan.currency)
    .bind(payment_method)
    .bind(transaction_id)
    .bind(plan_id)
    .bind(plan.duration_days)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Duplicate transaction id"))?;

    info!("Created payment {} for user {user_id} ({plan_id})", payment.id);
    Ok(payment)
}

pub async fn history(pool: &PgPool, user_id: i64) -> Result<Vec<PaymentRow>, AppError> {
    let rows = sqlx::query_as(
        "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn lock_user(conn: &mut PgConnection, user_id: i64) -> Result<UserRow, AppError> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Marks a locked pending payment completed and grants the plan's premium
/// days, stacking onto a still-running entitlement.
async fn complete_locked(
    conn: &mut PgConnection,
    payment: &PaymentRow,
    gateway_payment_id: &str,
    now: DateTime<Utc>,
) -> Result<PaymentRow, AppError> {
    let completed: PaymentRow = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = $1, completed_at = $2, gateway_payment_id = $3
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(PaymentStatus::Completed.as_str())
    .bind(now)
    .bind(gateway_payment_id)
    .bind(payment.id)
    .fetch_one(&mut *conn)
    .await?;

    if grants_premium(&completed.service_type) {
        let user = lock_user(&mut *conn, completed.user_id).await?;
        let expires = premium::extended_expiry(user.premium_expires, now, completed.service_duration);
        sqlx::query(
            "UPDATE users SET is_premium = TRUE, premium_expires = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(expires)
        .bind(user.id)
        .execute(&mut *conn)
        .await?;
        info!("User {} premium until {expires}", user.id);
    }
    Ok(completed)
}

/// Applies a gateway outcome to one of the caller's pending payments.
pub async fn settle_payment(
    pool: &PgPool,
    caller: &AuthUser,
    payment_id: i64,
    outcome: Settlement,
    gateway_payment_id: &str,
) -> Result<(PaymentRow, UserRow), AppError> {
    let mut tx = pool.begin().await?;

    let payment: PaymentRow = sqlx::query_as("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(payment_not_found)?;
    caller.ensure_owner(payment.user_id)?;

    let next = settle(payment.status.parse()?, outcome)?;
    let payment = match next {
        PaymentStatus::Completed => {
            complete_locked(&mut *tx, &payment, gateway_payment_id, Utc::now()).await?
        }
        _ => {
            sqlx::query_as("UPDATE payments SET status = $1 WHERE id = $2 RETURNING *")
                .bind(next.as_str())
                .bind(payment.id)
                .fetch_one(&mut *tx)
                .await?
        }
    };
    let user = lock_user(&mut *tx, payment.user_id).await?;
    tx.commit().await?;

    info!("Payment {} settled as {}", payment.id, payment.status);
    Ok((payment, user))
}

/// Looks up the caller's payment by transaction id. A pending payment is
/// completed when the gateway reports a payment id; otherwise the current
/// state is returned untouched.
pub async fn verify(
    pool: &PgPool,
    user_id: i64,
    transaction_id: &str,
    gateway_payment_id: Option<&str>,
) -> Result<(PaymentRow, UserRow), AppError> {
    let mut tx = pool.begin().await?;

    let payment: PaymentRow = sqlx::query_as(
        "SELECT * FROM payments WHERE transaction_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(transaction_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(payment_not_found)?;

    let payment = match gateway_payment_id {
        Some(gateway_id) if payment.status == PaymentStatus::Pending.as_str() => {
            complete_locked(&mut *tx, &payment, gateway_id, Utc::now()).await?
        }
        _ => payment,
    };
    let user = lock_user(&mut *tx, user_id).await?;
    tx.commit().await?;
    Ok((payment, user))
}

/// Refunds one of the caller's completed payments. Premium plans revoke the
/// entitlement outright, whatever other grants are still running.
pub async fn refund(
    pool: &PgPool,
    user_id: i64,
    payment_id: i64,
    reason: Option<&str>,
) -> Result<PaymentRow, AppError> {
    let mut tx = pool.begin().await?;

    let payment: PaymentRow =
        sqlx::query_as("SELECT * FROM payments WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(payment_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(payment_not_found)?;

    let now = Utc::now();
    check_refund(payment.status.parse()?, payment.completed_at, now)?;

    let refunded: PaymentRow = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = $1, refunded_at = $2, refund_reason = $3
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(PaymentStatus::Refunded.as_str())
    .bind(now)
    .bind(reason)
    .bind(payment.id)
    .fetch_one(&mut *tx)
    .await?;

    if grants_premium(&refunded.service_type) {
        sqlx::query(
            "UPDATE users SET is_premium = FALSE, premium_expires = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Refunded payment {} for user {user_id}", refunded.id);
    Ok(refunded)
}

/// Stops the subscription. Access is not extended again, but the expiry
/// stays recorded.
pub async fn cancel_subscription(pool: &PgPool, user_id: i64) -> Result<UserRow, AppError> {
    let user = sqlx::query_as(
        "UPDATE users SET is_premium = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    info!("User {user_id} cancelled premium subscription");
    Ok(user)
}
