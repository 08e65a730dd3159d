//! Payment lifecycle: `pending -> completed | failed`, `completed -> refunded`.
//! Nothing ever returns to `pending`, and `failed`/`refunded` are terminal.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::errors::AppError;

/// Whole days after completion during which a refund is still accepted.
pub const REFUND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "unknown payment status '{other}' in storage"
            ))),
        }
    }
}

/// Gateway outcome for a pending payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Success,
    Failure,
}

impl Settlement {
    /// `success` or `failure`; anything else is rejected.
    pub fn parse(action: &str) -> Result<Self, AppError> {
        match action {
            "success" => Ok(Settlement::Success),
            "failure" => Ok(Settlement::Failure),
            other => Err(AppError::Validation(format!(
                "action must be 'success' or 'failure', got '{other}'"
            ))),
        }
    }
}

/// The status a settlement moves `current` into.
pub fn settle(current: PaymentStatus, outcome: Settlement) -> Result<PaymentStatus, AppError> {
    if current != PaymentStatus::Pending {
        return Err(AppError::AlreadyProcessed(
            "Payment already processed".to_string(),
        ));
    }
    Ok(match outcome {
        Settlement::Success => PaymentStatus::Completed,
        Settlement::Failure => PaymentStatus::Failed,
    })
}

/// Refunds need a completed payment no more than seven elapsed whole days old.
pub fn check_refund(
    current: PaymentStatus,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let completed_at = match (current, completed_at) {
        (PaymentStatus::Completed, Some(at)) => at,
        _ => {
            return Err(AppError::InvalidInput(
                "Only completed payments can be refunded".to_string(),
            ))
        }
    };
    if (now - completed_at).num_days() > REFUND_WINDOW_DAYS {
        return Err(AppError::InvalidInput(format!(
            "Refund period has expired ({REFUND_WINDOW_DAYS} days)"
        )));
    }
    Ok(())
}
