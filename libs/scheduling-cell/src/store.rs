// libs/scheduling-cell/src/store.rs
use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::models::{
    Appointment, DayOfWeek, Schedule, SchedulingError, REASON_OVERLAP,
};

/// In-process store for schedules and appointments.
///
/// The write guard is the transaction boundary: every check-then-write path
/// (booking, rescheduling, schedule mutation guards) must run entirely under
/// one `write()` guard so that two concurrent requests for the same
/// doctor/clinic/slot cannot both be admitted.
pub struct SchedulingStore {
    inner: RwLock<StoreData>,
}

impl SchedulingStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreData::default()),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.inner.write().await
    }
}

impl Default for SchedulingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct StoreData {
    schedules: HashMap<Uuid, Schedule>,
    appointments: HashMap<Uuid, Appointment>,
}

impl StoreData {
    // ==========================================================================
    // SCHEDULES
    // ==========================================================================

    pub fn schedule(&self, id: Uuid) -> Option<&Schedule> {
        self.schedules.get(&id)
    }

    pub fn schedule_mut(&mut self, id: Uuid) -> Option<&mut Schedule> {
        self.schedules.get_mut(&id)
    }

    /// Resolve the schedule governing (doctor, clinic, day_of_week), if any.
    pub fn schedule_for(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        day_of_week: DayOfWeek,
    ) -> Option<&Schedule> {
        self.schedules.values().find(|schedule| {
            schedule.doctor_id == doctor_id
                && schedule.clinic_id == clinic_id
                && schedule.day_of_week == day_of_week
        })
    }

    /// Whether another schedule already occupies the (doctor, clinic, day) key.
    pub fn schedule_key_taken(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        day_of_week: DayOfWeek,
        exclude_id: Option<Uuid>,
    ) -> bool {
        self.schedules.values().any(|schedule| {
            Some(schedule.id) != exclude_id
                && schedule.doctor_id == doctor_id
                && schedule.clinic_id == clinic_id
                && schedule.day_of_week == day_of_week
        })
    }

    pub fn insert_schedule(&mut self, schedule: Schedule) -> Result<(), SchedulingError> {
        if self.schedule_key_taken(
            schedule.doctor_id,
            schedule.clinic_id,
            schedule.day_of_week,
            Some(schedule.id),
        ) {
            return Err(SchedulingError::Conflict(
                "a schedule already exists for this doctor, clinic and day of week".to_string(),
            ));
        }
        self.schedules.insert(schedule.id, schedule);
        Ok(())
    }

    pub fn remove_schedule(&mut self, id: Uuid) -> Option<Schedule> {
        self.schedules.remove(&id)
    }

    pub fn schedules_matching(
        &self,
        doctor_id: Option<Uuid>,
        clinic_id: Option<Uuid>,
    ) -> Vec<Schedule> {
        let mut matching: Vec<Schedule> = self
            .schedules
            .values()
            .filter(|schedule| {
                doctor_id.map_or(true, |id| schedule.doctor_id == id)
                    && clinic_id.map_or(true, |id| schedule.clinic_id == id)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|schedule| {
            (
                schedule.doctor_id,
                schedule.clinic_id,
                u8::from(schedule.day_of_week),
            )
        });
        matching
    }

    // ==========================================================================
    // APPOINTMENTS
    // ==========================================================================

    /// Fetch an appointment by id. Soft-deleted rows are invisible.
    pub fn appointment(&self, id: Uuid) -> Option<&Appointment> {
        self.appointments
            .get(&id)
            .filter(|appointment| appointment.deleted_at.is_none())
    }

    pub fn appointment_mut(&mut self, id: Uuid) -> Option<&mut Appointment> {
        self.appointments
            .get_mut(&id)
            .filter(|appointment| appointment.deleted_at.is_none())
    }

    pub fn appointment_by_public_code(&self, code: &str) -> Option<&Appointment> {
        self.appointments
            .values()
            .find(|appointment| appointment.deleted_at.is_none() && appointment.public_code == code)
    }

    /// Insert a new appointment, enforcing the normalized active-slot
    /// uniqueness key (doctor, clinic, start). A violation here means the
    /// availability pre-check was raced or bypassed; it is reported with the
    /// same message the pre-check would have produced.
    pub fn insert_appointment(&mut self, appointment: Appointment) -> Result<(), SchedulingError> {
        let slot_taken = self.appointments.values().any(|existing| {
            existing.is_active()
                && existing.doctor_id == appointment.doctor_id
                && existing.clinic_id == appointment.clinic_id
                && existing.appointment_start == appointment.appointment_start
        });
        if slot_taken {
            return Err(SchedulingError::Conflict(REASON_OVERLAP.to_string()));
        }
        self.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    /// All active (Pending/Confirmed, not deleted) appointments for a doctor
    /// at a clinic on one date, ordered by start time.
    pub fn active_appointments_on(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self
            .appointments
            .values()
            .filter(|appointment| {
                appointment.is_active()
                    && Some(appointment.id) != exclude_id
                    && appointment.doctor_id == doctor_id
                    && appointment.clinic_id == clinic_id
                    && appointment.appointment_date == date
            })
            .collect();
        appointments.sort_by_key(|appointment| appointment.appointment_start);
        appointments
    }

    /// Active appointments for a doctor at a clinic with appointment_date in
    /// the inclusive [from, to] range, ordered by id ascending.
    pub fn active_appointments_in_range(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self
            .appointments
            .values()
            .filter(|appointment| {
                appointment.is_active()
                    && appointment.doctor_id == doctor_id
                    && appointment.clinic_id == clinic_id
                    && appointment.appointment_date >= date_from
                    && appointment.appointment_date <= date_to
            })
            .collect();
        appointments.sort_by_key(|appointment| appointment.id);
        appointments
    }

    /// Guard predicate for schedule mutations: any active appointment for this
    /// doctor and clinic whose date falls on the given weekday, past or future.
    pub fn has_active_on_weekday(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        day_of_week: DayOfWeek,
    ) -> bool {
        self.appointments.values().any(|appointment| {
            appointment.is_active()
                && appointment.doctor_id == doctor_id
                && appointment.clinic_id == clinic_id
                && DayOfWeek::from_date(appointment.appointment_date) == day_of_week
        })
    }
}
