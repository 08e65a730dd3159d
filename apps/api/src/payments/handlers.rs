use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::payments::repo;
use crate::payments::state_machine::Settlement;
use crate::state::AppState;
use crate::users::{self, premium};

const DEFAULT_PAYMENT_METHOD: &str = "razorpay";

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub plan_id: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    "success".to_string()
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub transaction_id: Option<String>,
    pub gateway_payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub payment_id: Option<i64>,
    pub reason: Option<String>,
}

/// Gateway reference in the shape the simulated gateway hands out.
fn simulated_gateway_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("pay_{}", &hex[..16])
}

/// GET /api/payments/plans
pub async fn handle_list_plans(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "plans": state.catalog.plans() }))
}

/// POST /api/payments/create-payment
pub async fn handle_create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let plan_id = req.plan_id.as_deref().unwrap_or_default();
    let plan = state
        .catalog
        .plan(plan_id)
        .ok_or_else(|| AppError::InvalidPlan("Invalid payment plan".to_string()))?;
    let account = users::repo::require_user(&state.db, user.id).await?;

    let method = req
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD);
    let transaction_id = Uuid::new_v4().to_string();
    let payment = repo::create(&state.db, account.id, plan_id, plan, method, &transaction_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Payment created successfully",
            "payment": {
                "payment_id": payment.id,
                "transaction_id": payment.transaction_id,
                "amount": payment.amount,
                "currency": payment.currency,
                "plan": plan,
                "gateway_url": format!("/api/payments/simulate-gateway/{}", payment.id),
                "status": payment.status
            }
        })),
    ))
}

/// POST /api/payments/simulate-gateway/:id
///
/// A failed settlement still answers with the payment, under 400.
pub async fn handle_simulate_gateway(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(payment_id): AppPath<i64>,
    AppJson(req): AppJson<SimulateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let outcome = Settlement::parse(req.action.trim())?;
    let (payment, account) =
        repo::settle_payment(&state.db, &user, payment_id, outcome, &simulated_gateway_id()).await?;

    let response = match outcome {
        Settlement::Success => (
            StatusCode::OK,
            Json(json!({
                "message": "Payment completed successfully",
                "payment": payment,
                "user": account
            })),
        ),
        Settlement::Failure => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Payment failed", "payment": payment })),
        ),
    };
    Ok(response)
}

/// POST /api/payments/verify-payment
pub async fn handle_verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<VerifyRequest>,
) -> Result<Json<Value>, AppError> {
    let transaction_id = req
        .transaction_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Transaction ID is required".to_string()))?;
    let gateway_id = req
        .gateway_payment_id
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    let (payment, account) = repo::verify(&state.db, user.id, transaction_id, gateway_id).await?;
    let account = users::repo::correct_stale_premium(&state.db, account).await?;
    Ok(Json(json!({ "payment": payment, "user": account })))
}

/// GET /api/payments/history
pub async fn handle_payment_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let payments = repo::history(&state.db, user.id).await?;
    Ok(Json(json!({ "payments": payments })))
}

/// GET /api/payments/subscription-status
pub async fn handle_subscription_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let account = users::repo::require_user(&state.db, user.id).await?;
    let now = Utc::now();
    Ok(Json(json!({
        "is_premium": premium::is_active(account.is_premium, account.premium_expires, now),
        "premium_expires": account.premium_expires,
        "days_remaining": premium::days_remaining(account.is_premium, account.premium_expires, now),
        "user": account
    })))
}

/// POST /api/payments/cancel-subscription
pub async fn handle_cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let account = users::repo::require_user(&state.db, user.id).await?;
    if !account.is_premium {
        return Err(AppError::InvalidInput(
            "No active subscription found".to_string(),
        ));
    }
    let account = repo::cancel_subscription(&state.db, account.id).await?;
    Ok(Json(json!({
        "message": "Subscription cancelled successfully",
        "user": account
    })))
}

/// POST /api/payments/refund
pub async fn handle_refund(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<RefundRequest>,
) -> Result<Json<Value>, AppError> {
    let payment_id = req
        .payment_id
        .ok_or_else(|| AppError::Validation("Payment ID is required".to_string()))?;
    let reason = req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let payment = repo::refund(&state.db, user.id, payment_id, reason).await?;
    Ok(Json(json!({
        "message": "Refund processed successfully",
        "payment": payment
    })))
}
