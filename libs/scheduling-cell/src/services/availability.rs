// libs/scheduling-cell/src/services/availability.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    DayOfWeek, Schedule, SchedulingError, REASON_DOCTOR_UNAVAILABLE, REASON_OUTSIDE_SCHEDULE,
    REASON_OVERLAP, REASON_SCHEDULE_MISCONFIGURED,
};
use crate::store::StoreData;

/// Admission check for a candidate appointment slot.
///
/// The checker is pure over a store snapshot; callers that go on to write
/// (booking, rescheduling) must run it under the same write guard as the
/// write itself so the decision cannot be raced.
pub struct AvailabilityChecker;

impl AvailabilityChecker {
    /// Decide whether (doctor, clinic, candidate_start) is bookable, checking
    /// in order: schedule existence/availability, schedule configuration,
    /// schedule bounds, and overlap with existing active appointments.
    ///
    /// `duration_minutes` defaults to the governing schedule's slot duration.
    /// `ignore_appointment_id` excludes an appointment from the overlap scan
    /// so a reschedule does not conflict with itself.
    ///
    /// Returns the governing schedule on success so callers can snapshot its
    /// slot duration.
    pub fn check<'a>(
        data: &'a StoreData,
        doctor_id: Uuid,
        clinic_id: Uuid,
        candidate_start: DateTime<Utc>,
        duration_minutes: Option<i32>,
        ignore_appointment_id: Option<Uuid>,
    ) -> Result<&'a Schedule, SchedulingError> {
        let date = candidate_start.date_naive();
        let day_of_week = DayOfWeek::from_date(date);
        debug!(
            "Checking availability for doctor {} at clinic {} on {} ({})",
            doctor_id, clinic_id, candidate_start, day_of_week
        );

        let schedule = data
            .schedule_for(doctor_id, clinic_id, day_of_week)
            .filter(|schedule| schedule.is_available)
            .ok_or_else(|| SchedulingError::Conflict(REASON_DOCTOR_UNAVAILABLE.to_string()))?;

        if schedule.end_time <= schedule.start_time || schedule.slot_duration_minutes <= 0 {
            warn!("Schedule {} has degenerate bounds", schedule.id);
            return Err(SchedulingError::Conflict(
                REASON_SCHEDULE_MISCONFIGURED.to_string(),
            ));
        }

        let duration = duration_minutes.unwrap_or(schedule.slot_duration_minutes);
        let schedule_start = date.and_time(schedule.start_time).and_utc();
        let schedule_end = date.and_time(schedule.end_time).and_utc();
        let candidate_end = candidate_start + Duration::minutes(duration as i64);

        if candidate_start < schedule_start || candidate_end > schedule_end {
            return Err(SchedulingError::Conflict(REASON_OUTSIDE_SCHEDULE.to_string()));
        }

        let overlapping = data
            .active_appointments_on(doctor_id, clinic_id, date, ignore_appointment_id)
            .into_iter()
            .find(|existing| {
                intervals_overlap(
                    candidate_start,
                    candidate_end,
                    existing.appointment_start,
                    existing.scheduled_end_time(),
                )
            });

        if let Some(existing) = overlapping {
            warn!(
                "Slot {} conflicts with appointment {} for doctor {}",
                candidate_start, existing.id, doctor_id
            );
            return Err(SchedulingError::Conflict(REASON_OVERLAP.to_string()));
        }

        Ok(schedule)
    }
}

/// Half-open interval overlap: [a_start, a_end) and [b_start, b_end) overlap
/// iff a_start < b_end and b_start < a_end.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 16, hour, minute, 0).unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        // Back-to-back intervals share a boundary but do not overlap.
        assert!(!intervals_overlap(at(10, 0), at(10, 30), at(10, 30), at(11, 0)));
        assert!(intervals_overlap(at(10, 0), at(10, 30), at(10, 15), at(10, 45)));
        assert!(intervals_overlap(at(10, 0), at(11, 0), at(10, 15), at(10, 30)));
        assert!(!intervals_overlap(at(10, 0), at(10, 30), at(11, 0), at(11, 30)));
    }
}
