// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// DAY OF WEEK
// ==============================================================================

/// Day of the week a recurring schedule applies to. Serialized as the
/// integer 0-6 with 0 = Sunday, matching the clinic data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DayOfWeek::Sunday),
            1 => Ok(DayOfWeek::Monday),
            2 => Ok(DayOfWeek::Tuesday),
            3 => Ok(DayOfWeek::Wednesday),
            4 => Ok(DayOfWeek::Thursday),
            5 => Ok(DayOfWeek::Friday),
            6 => Ok(DayOfWeek::Saturday),
            other => Err(format!(
                "day of week must be between 0 (Sunday) and 6 (Saturday), got {}",
                other
            )),
        }
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> u8 {
        day as u8
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        };
        write!(f, "{}", name)
    }
}

// ==============================================================================
// SCHEDULE
// ==============================================================================

/// Recurring weekly availability window for one doctor at one clinic.
/// Unique per (doctor_id, clinic_id, day_of_week).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 30;

// ==============================================================================
// APPOINTMENT
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Active appointments occupy a slot; terminal ones do not.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    InPerson,
    Telemedicine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    /// Opaque identifier safe to hand to patients for public lookup.
    pub public_code: String,
    pub patient_id: Uuid,
    pub clinic_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_start: DateTime<Utc>,
    /// Snapshot of the governing schedule's slot duration, taken at booking
    /// time and refreshed on reschedule. Later schedule edits do not change it.
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub appointment_type: AppointmentType,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.appointment_start + Duration::minutes(self.duration_minutes as i64)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active() && self.deleted_at.is_none()
    }
}

/// Generate the opaque public lookup code for a new appointment.
pub fn new_public_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("APT-{}", &raw[..12].to_uppercase())
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

/// A bookable half-open interval [start, end) on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub doctor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub day_of_week: Option<DayOfWeek>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_duration_minutes: Option<i32>,
    pub is_available: Option<bool>,
}

impl UpdateScheduleRequest {
    /// Whether the patch touches any field of the (doctor, clinic, day) key.
    pub fn changes_key(&self) -> bool {
        self.doctor_id.is_some() || self.clinic_id.is_some() || self.day_of_week.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub appointment_start: DateTime<Utc>,
    pub appointment_type: Option<AppointmentType>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCancelRequest {
    pub appointment_ids: Vec<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRescheduleRequest {
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub new_date: NaiveDate,
    pub new_time: NaiveTime,
}

/// Aggregate outcome of a multi-appointment operation. Per-item failures are
/// collected here instead of aborting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResult {
    pub succeeded: u32,
    pub failed: u32,
    pub errors: BTreeMap<Uuid, String>,
}

impl BulkResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: Uuid, message: String) {
        self.failed += 1;
        self.errors.insert(id, message);
    }

    pub fn outcome(&self) -> BulkOutcome {
        if self.failed == 0 {
            BulkOutcome::FullSuccess
        } else if self.succeeded > 0 {
            BulkOutcome::PartialSuccess
        } else {
            BulkOutcome::Failure
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    FullSuccess,
    PartialSuccess,
    Failure,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Conflict reasons surfaced to callers. The storage layer reuses
/// [`REASON_OVERLAP`] for slot-key violations so the error vocabulary is the
/// same no matter which layer detects the clash.
pub const REASON_DOCTOR_UNAVAILABLE: &str = "doctor not available on selected date";
pub const REASON_SCHEDULE_MISCONFIGURED: &str = "schedule not properly configured";
pub const REASON_OUTSIDE_SCHEDULE: &str = "selected time is outside the doctor's schedule";
pub const REASON_OVERLAP: &str = "selected time overlaps another appointment";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid status transition from {current} to {requested}")]
    InvalidTransition {
        current: AppointmentStatus,
        requested: AppointmentStatus,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::Conflict(msg) => AppError::Conflict(msg),
            SchedulingError::InvalidTransition { .. } => AppError::Unprocessable(err.to_string()),
            SchedulingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            SchedulingError::Unauthorized(msg) => AppError::Auth(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_round_trips_through_integers() {
        for value in 0u8..=6 {
            let day = DayOfWeek::try_from(value).unwrap();
            assert_eq!(u8::from(day), value);
        }
        assert!(DayOfWeek::try_from(7).is_err());
    }

    #[test]
    fn day_of_week_from_date_uses_sunday_zero() {
        // 2025-06-15 is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(DayOfWeek::from_date(sunday), DayOfWeek::Sunday);
        assert_eq!(
            DayOfWeek::from_date(sunday.succ_opt().unwrap()),
            DayOfWeek::Monday
        );
    }

    #[test]
    fn terminal_statuses_are_not_active() {
        assert!(AppointmentStatus::Pending.is_active());
        assert!(AppointmentStatus::Confirmed.is_active());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn public_codes_are_prefixed_and_unique() {
        let a = new_public_code();
        let b = new_public_code();
        assert!(a.starts_with("APT-"));
        assert_ne!(a, b);
    }
}
