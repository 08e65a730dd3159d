//! Premium entitlement is derived: the stored flag only counts while the
//! expiry lies in the future.

use chrono::{DateTime, Duration, Utc};

pub fn is_active(flag: bool, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    flag && expires.map_or(false, |at| at > now)
}

/// A raised flag whose expiry has passed (or was never set).
pub fn is_stale(flag: bool, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    flag && !is_active(flag, expires, now)
}

/// Whole days left on an active entitlement, zero otherwise.
pub fn days_remaining(flag: bool, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match expires {
        Some(at) if is_active(flag, expires, now) => (at - now).num_days(),
        _ => 0,
    }
}

/// New expiry after granting `duration_days`: stacks onto a running
/// entitlement, or starts from `now` when none is running.
pub fn extended_expiry(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_days: i32,
) -> DateTime<Utc> {
    let base = current.filter(|at| *at > now).unwrap_or(now);
    base + Duration::days(i64::from(duration_days))
}
