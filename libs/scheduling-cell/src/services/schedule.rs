// libs/scheduling-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    CreateScheduleRequest, Schedule, SchedulingError, UpdateScheduleRequest,
    DEFAULT_SLOT_DURATION_MINUTES,
};
use crate::store::SchedulingStore;

const ACTIVE_APPOINTMENTS_GUARD: &str =
    "schedule has active appointments on this day of week and cannot be changed";

/// Manages each doctor's recurring weekly availability per clinic.
///
/// Mutations that would strand active appointments (disabling, re-keying or
/// deleting a schedule whose weekday still carries Pending/Confirmed
/// appointments, on any date) are refused with a conflict. The guard is
/// evaluated under the same write guard as the mutation itself.
pub struct ScheduleService {
    store: Arc<SchedulingStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> Result<Schedule, SchedulingError> {
        debug!(
            "Creating schedule for doctor {} at clinic {} on {}",
            request.doctor_id, request.clinic_id, request.day_of_week
        );

        if request.end_time <= request.start_time {
            return Err(SchedulingError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }
        let slot_duration = request
            .slot_duration_minutes
            .unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
        if slot_duration <= 0 {
            return Err(SchedulingError::Validation(
                "slot_duration_minutes must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            clinic_id: request.clinic_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_duration_minutes: slot_duration,
            is_available: request.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let mut data = self.store.write().await;
        data.insert_schedule(schedule.clone())?;

        info!("Schedule {} created", schedule.id);
        Ok(schedule)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        patch: UpdateScheduleRequest,
    ) -> Result<Schedule, SchedulingError> {
        let mut data = self.store.write().await;
        let current = data
            .schedule(schedule_id)
            .cloned()
            .ok_or(SchedulingError::NotFound("schedule"))?;

        let new_start = patch.start_time.unwrap_or(current.start_time);
        let new_end = patch.end_time.unwrap_or(current.end_time);
        if new_end <= new_start {
            return Err(SchedulingError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }
        if let Some(duration) = patch.slot_duration_minutes {
            if duration <= 0 {
                return Err(SchedulingError::Validation(
                    "slot_duration_minutes must be positive".to_string(),
                ));
            }
        }

        let new_doctor = patch.doctor_id.unwrap_or(current.doctor_id);
        let new_clinic = patch.clinic_id.unwrap_or(current.clinic_id);
        let new_day = patch.day_of_week.unwrap_or(current.day_of_week);
        let key_changed = (new_doctor, new_clinic, new_day)
            != (current.doctor_id, current.clinic_id, current.day_of_week);

        if key_changed
            && data.schedule_key_taken(new_doctor, new_clinic, new_day, Some(schedule_id))
        {
            return Err(SchedulingError::Conflict(
                "a schedule already exists for this doctor, clinic and day of week".to_string(),
            ));
        }

        let disabling = patch.is_available == Some(false);
        if (key_changed || disabling)
            && data.has_active_on_weekday(current.doctor_id, current.clinic_id, current.day_of_week)
        {
            warn!(
                "Refusing update of schedule {}: active appointments on {}",
                schedule_id, current.day_of_week
            );
            return Err(SchedulingError::Conflict(ACTIVE_APPOINTMENTS_GUARD.to_string()));
        }

        let schedule = data
            .schedule_mut(schedule_id)
            .ok_or(SchedulingError::NotFound("schedule"))?;
        schedule.doctor_id = new_doctor;
        schedule.clinic_id = new_clinic;
        schedule.day_of_week = new_day;
        schedule.start_time = new_start;
        schedule.end_time = new_end;
        if let Some(duration) = patch.slot_duration_minutes {
            schedule.slot_duration_minutes = duration;
        }
        if let Some(is_available) = patch.is_available {
            schedule.is_available = is_available;
        }
        schedule.updated_at = Utc::now();

        info!("Schedule {} updated", schedule_id);
        Ok(schedule.clone())
    }

    pub async fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), SchedulingError> {
        let mut data = self.store.write().await;
        let current = data
            .schedule(schedule_id)
            .cloned()
            .ok_or(SchedulingError::NotFound("schedule"))?;

        if data.has_active_on_weekday(current.doctor_id, current.clinic_id, current.day_of_week) {
            warn!(
                "Refusing delete of schedule {}: active appointments on {}",
                schedule_id, current.day_of_week
            );
            return Err(SchedulingError::Conflict(ACTIVE_APPOINTMENTS_GUARD.to_string()));
        }

        data.remove_schedule(schedule_id);
        info!("Schedule {} deleted", schedule_id);
        Ok(())
    }

    /// Flip is_available. Turning a schedule off is guarded like a delete;
    /// turning it back on is always allowed.
    pub async fn toggle_availability(&self, schedule_id: Uuid) -> Result<Schedule, SchedulingError> {
        let mut data = self.store.write().await;
        let current = data
            .schedule(schedule_id)
            .cloned()
            .ok_or(SchedulingError::NotFound("schedule"))?;

        if current.is_available
            && data.has_active_on_weekday(current.doctor_id, current.clinic_id, current.day_of_week)
        {
            return Err(SchedulingError::Conflict(ACTIVE_APPOINTMENTS_GUARD.to_string()));
        }

        let schedule = data
            .schedule_mut(schedule_id)
            .ok_or(SchedulingError::NotFound("schedule"))?;
        schedule.is_available = !schedule.is_available;
        schedule.updated_at = Utc::now();

        info!(
            "Schedule {} availability toggled to {}",
            schedule_id, schedule.is_available
        );
        Ok(schedule.clone())
    }

    pub async fn list_schedules(
        &self,
        doctor_id: Option<Uuid>,
        clinic_id: Option<Uuid>,
    ) -> Vec<Schedule> {
        let data = self.store.read().await;
        data.schedules_matching(doctor_id, clinic_id)
    }
}
