use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::ScheduleEntry;

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

/// Body of both `POST /{doctor_id}/schedules` and `PUT /schedules/{schedule_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default, with = "shared_models::time::weekday::option")]
    pub day_of_week: Option<Weekday>,
    #[serde(default)]
    pub specific_date: Option<NaiveDate>,
    #[serde(with = "shared_models::time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_models::time::hhmm")]
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub notes: Option<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: ScheduleEntry,
    pub doctor_name: String,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// A bookable `[start_time, end_time)` interval on the queried date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    #[serde(with = "shared_models::time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_models::time::hhmm")]
    pub end_time: NaiveTime,
}

impl AvailabilitySlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { start_time, end_time }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Doctor not found with ID: {0}")]
    DoctorNotFound(Uuid),

    #[error("Doctor schedule not found with ID: {0}")]
    ScheduleNotFound(Uuid),

    #[error("{0}")]
    Forbidden(String),

    #[error("Start time must be before end time.")]
    InvalidTimeRange,

    #[error("Schedule times must fall on a whole minute, got {0}.")]
    TimeNotOnMinute(NaiveTime),

    #[error("Slot duration must be at least {min} minutes, got {got}.")]
    SlotTooShort { min: i32, got: i32 },

    #[error("Either dayOfWeek or specificDate must be provided for a schedule.")]
    MissingRule,

    #[error("Specific date {0} must be today or in the future.")]
    DateInPast(NaiveDate),

    #[error("Schedule overlaps existing entry {existing} ({window})")]
    Overlapping { existing: Uuid, window: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ScheduleError> for AppError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::DoctorNotFound(_) | ScheduleError::ScheduleNotFound(_) => {
                AppError::NotFound(error.to_string())
            }
            ScheduleError::Forbidden(msg) => AppError::Forbidden(msg),
            ScheduleError::InvalidTimeRange
            | ScheduleError::TimeNotOnMinute(_)
            | ScheduleError::SlotTooShort { .. }
            | ScheduleError::MissingRule
            | ScheduleError::DateInPast(_)
            | ScheduleError::Overlapping { .. } => AppError::BadRequest(error.to_string()),
            ScheduleError::Store(StoreError::NotFound(what)) => {
                AppError::NotFound(format!("{} not found", what))
            }
            ScheduleError::Store(StoreError::Conflict(msg)) => AppError::Conflict(msg),
            ScheduleError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
