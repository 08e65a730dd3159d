use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    /// One of `pending`, `completed`, `failed`, `refunded`.
    pub status: String,
    pub transaction_id: String,
    pub gateway_payment_id: Option<String>,
    /// Plan id the payment was created for.
    pub service_type: String,
    /// Plan duration in days, copied at creation.
    pub service_duration: i32,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}
