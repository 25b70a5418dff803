// libs/scheduling-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::CallerIdentity;

use crate::models::{
    new_public_code, Appointment, AppointmentStatus, AppointmentType, BookAppointmentRequest,
    SchedulingError,
};
use crate::services::availability::AvailabilityChecker;
use crate::store::SchedulingStore;

/// The state machine governing an appointment's status, and the only path by
/// which status, date or time may change.
///
/// Every mutation runs its availability check and its write under a single
/// store write guard, so a booking decision cannot be invalidated between
/// check and commit.
pub struct AppointmentLifecycleService {
    store: Arc<SchedulingStore>,
}

impl AppointmentLifecycleService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    // ==========================================================================
    // STATE MACHINE
    // ==========================================================================

    /// Allowed next statuses. Completed, Cancelled and NoShow are terminal.
    pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Pending => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn validate_transition(
        current: AppointmentStatus,
        requested: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if Self::valid_transitions(current).contains(&requested) {
            Ok(())
        } else {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current, requested
            );
            Err(SchedulingError::InvalidTransition { current, requested })
        }
    }

    // ==========================================================================
    // OPERATIONS
    // ==========================================================================

    /// Book a new appointment. The slot must pass the availability check; the
    /// governing schedule's slot duration is snapshotted onto the appointment.
    pub async fn create_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Booking appointment for patient {} with doctor {} at {}",
            request.patient_id, request.doctor_id, request.appointment_start
        );

        let mut data = self.store.write().await;
        let schedule = AvailabilityChecker::check(
            &data,
            request.doctor_id,
            request.clinic_id,
            request.appointment_start,
            None,
            None,
        )?;
        let duration_minutes = schedule.slot_duration_minutes;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            public_code: new_public_code(),
            patient_id: request.patient_id,
            clinic_id: request.clinic_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_start.date_naive(),
            appointment_start: request.appointment_start,
            duration_minutes,
            status: AppointmentStatus::Pending,
            appointment_type: request.appointment_type.unwrap_or(AppointmentType::InPerson),
            reason: request.reason,
            notes: request.notes,
            cancellation_reason: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        data.insert_appointment(appointment.clone())?;
        info!("Appointment {} booked as pending", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        let data = self.store.read().await;
        data.appointment(id)
            .cloned()
            .ok_or(SchedulingError::NotFound("appointment"))
    }

    pub async fn get_by_public_code(&self, code: &str) -> Result<Appointment, SchedulingError> {
        let data = self.store.read().await;
        data.appointment_by_public_code(code)
            .cloned()
            .ok_or(SchedulingError::NotFound("appointment"))
    }

    /// Validate and persist a status change. Only the status (and updated_at)
    /// is written; an invalid transition persists nothing.
    pub async fn transition(
        &self,
        id: Uuid,
        requested: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut data = self.store.write().await;
        let current = data
            .appointment(id)
            .ok_or(SchedulingError::NotFound("appointment"))?
            .status;
        Self::validate_transition(current, requested)?;

        let appointment = data
            .appointment_mut(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        appointment.status = requested;
        appointment.updated_at = Utc::now();

        info!("Appointment {} transitioned {} -> {}", id, current, requested);
        Ok(appointment.clone())
    }

    pub async fn confirm(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.transition(id, AppointmentStatus::Confirmed).await
    }

    pub async fn complete(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.transition(id, AppointmentStatus::Completed).await
    }

    /// Cancel an appointment. Patients may only cancel their own; doctors and
    /// admins may cancel any.
    pub async fn cancel(
        &self,
        id: Uuid,
        reason: Option<String>,
        caller: &CallerIdentity,
    ) -> Result<Appointment, SchedulingError> {
        let mut data = self.store.write().await;
        let appointment = data
            .appointment(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        let current = appointment.status;
        let patient_id = appointment.patient_id;

        if !caller.can_manage(patient_id) {
            return Err(SchedulingError::Unauthorized(
                "patients may only cancel their own appointments".to_string(),
            ));
        }
        Self::validate_transition(current, AppointmentStatus::Cancelled)?;

        let appointment = data
            .appointment_mut(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        appointment.status = AppointmentStatus::Cancelled;
        if reason.is_some() {
            appointment.cancellation_reason = reason;
        }
        appointment.updated_at = Utc::now();

        info!("Appointment {} cancelled", id);
        Ok(appointment.clone())
    }

    /// Move an appointment to a new date and time. The target slot is checked
    /// with this appointment excluded from the overlap scan; on success the
    /// status returns to Pending and the duration is re-snapshotted from the
    /// schedule governing the new date.
    pub async fn reschedule(
        &self,
        id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
        caller: &CallerIdentity,
    ) -> Result<Appointment, SchedulingError> {
        let mut data = self.store.write().await;
        let appointment = data
            .appointment(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        let current = appointment.status;
        let patient_id = appointment.patient_id;
        let doctor_id = appointment.doctor_id;
        let clinic_id = appointment.clinic_id;

        if !caller.can_manage(patient_id) {
            return Err(SchedulingError::Unauthorized(
                "patients may only reschedule their own appointments".to_string(),
            ));
        }
        if current.is_terminal() {
            return Err(SchedulingError::InvalidTransition {
                current,
                requested: AppointmentStatus::Pending,
            });
        }

        let new_start = new_date.and_time(new_time).and_utc();
        let schedule =
            AvailabilityChecker::check(&data, doctor_id, clinic_id, new_start, None, Some(id))?;
        let duration_minutes = schedule.slot_duration_minutes;

        let appointment = data
            .appointment_mut(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        appointment.appointment_date = new_date;
        appointment.appointment_start = new_start;
        appointment.duration_minutes = duration_minutes;
        appointment.status = AppointmentStatus::Pending;
        appointment.updated_at = Utc::now();

        info!("Appointment {} rescheduled to {}", id, new_start);
        Ok(appointment.clone())
    }

    /// Cancellation-adjacent soft delete: an active appointment is cancelled
    /// first, then hidden. The row itself is never removed.
    pub async fn delete_appointment(
        &self,
        id: Uuid,
        caller: &CallerIdentity,
    ) -> Result<(), SchedulingError> {
        let mut data = self.store.write().await;
        let appointment = data
            .appointment(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        let current = appointment.status;
        let patient_id = appointment.patient_id;

        if !caller.can_manage(patient_id) {
            return Err(SchedulingError::Unauthorized(
                "patients may only delete their own appointments".to_string(),
            ));
        }
        if current.is_active() {
            Self::validate_transition(current, AppointmentStatus::Cancelled)?;
        }

        let appointment = data
            .appointment_mut(id)
            .ok_or(SchedulingError::NotFound("appointment"))?;
        if appointment.status.is_active() {
            appointment.status = AppointmentStatus::Cancelled;
        }
        appointment.deleted_at = Some(Utc::now());
        appointment.updated_at = Utc::now();

        info!("Appointment {} soft-deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pending_may_confirm_or_cancel() {
        assert!(AppointmentLifecycleService::validate_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed
        )
        .is_ok());
        assert!(AppointmentLifecycleService::validate_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled
        )
        .is_ok());
        assert_matches!(
            AppointmentLifecycleService::validate_transition(
                AppointmentStatus::Pending,
                AppointmentStatus::Completed
            ),
            Err(SchedulingError::InvalidTransition {
                current: AppointmentStatus::Pending,
                requested: AppointmentStatus::Completed,
            })
        );
    }

    #[test]
    fn terminal_states_allow_nothing() {
        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(AppointmentLifecycleService::valid_transitions(terminal).is_empty());
        }
    }

    #[test]
    fn confirmed_may_complete_cancel_or_no_show() {
        let next = AppointmentLifecycleService::valid_transitions(AppointmentStatus::Confirmed);
        assert!(next.contains(&AppointmentStatus::Completed));
        assert!(next.contains(&AppointmentStatus::Cancelled));
        assert!(next.contains(&AppointmentStatus::NoShow));
        assert!(!next.contains(&AppointmentStatus::Pending));
    }
}
