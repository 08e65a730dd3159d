use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::models::Mentor;
use crate::errors::AppError;

pub const AVAILABILITY_HORIZON_DAYS: u64 = 30;

#[derive(Debug, Serialize)]
pub struct Slot<'a> {
    pub time: &'a str,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct DayAvailability<'a> {
    pub date: NaiveDate,
    pub day: String,
    pub slots: Vec<Slot<'a>>,
}

/// Open days over the next 30 days starting at `today`. Every configured
/// slot is reported free since bookings are not persisted.
pub fn availability(mentor: &Mentor, today: NaiveDate) -> Vec<DayAvailability<'_>> {
    (0..AVAILABILITY_HORIZON_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| {
            let day = date.format("%A").to_string();
            mentor.availability.days.contains(&day).then(|| DayAvailability {
                date,
                day,
                slots: mentor
                    .availability
                    .time_slots
                    .iter()
                    .map(|time| Slot {
                        time,
                        available: true,
                    })
                    .collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    #[default]
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "package_5")]
    Package5,
    #[serde(rename = "package_10")]
    Package10,
}

impl SessionType {
    pub fn sessions(&self) -> u32 {
        match self {
            SessionType::Single => 1,
            SessionType::Package5 => 5,
            SessionType::Package10 => 10,
        }
    }

    pub fn price(&self, mentor: &Mentor) -> u32 {
        match self {
            SessionType::Single => mentor.pricing.per_session,
            SessionType::Package5 => mentor.pricing.package_5,
            SessionType::Package10 => mentor.pricing.package_10,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub session_date: String,
    pub session_time: String,
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MentorInfo {
    pub name: String,
    pub college: String,
    pub expertise: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingQuote {
    pub id: Uuid,
    pub user_id: i64,
    pub mentor_id: i64,
    pub session_date: String,
    pub session_time: String,
    pub session_type: SessionType,
    pub sessions_count: u32,
    pub amount: u32,
    pub status: &'static str,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub mentor_info: MentorInfo,
}

fn session_start(req: &BookingRequest) -> Result<NaiveDateTime, AppError> {
    let raw = format!("{} {}", req.session_date.trim(), req.session_time.trim());
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M")
        .map_err(|_| AppError::Validation("Invalid date/time format".into()))
}

/// Prices a session request. Nothing is stored; the quote awaits payment.
pub fn quote_booking(
    mentor: &Mentor,
    user_id: i64,
    req: BookingRequest,
    now: DateTime<Utc>,
) -> Result<BookingQuote, AppError> {
    if !mentor.is_available {
        return Err(AppError::InvalidInput(
            "Mentor is currently unavailable".into(),
        ));
    }
    if session_start(&req)? <= now.naive_utc() {
        return Err(AppError::InvalidInput(
            "Session must be scheduled for future date/time".into(),
        ));
    }

    Ok(BookingQuote {
        id: Uuid::new_v4(),
        user_id,
        mentor_id: mentor.id,
        sessions_count: req.session_type.sessions(),
        amount: req.session_type.price(mentor),
        session_type: req.session_type,
        session_date: req.session_date,
        session_time: req.session_time,
        status: "pending_payment",
        message: req.message,
        created_at: now,
        mentor_info: MentorInfo {
            name: mentor.name.clone(),
            college: mentor.college.clone(),
            expertise: mentor.expertise.clone(),
        },
    })
}
