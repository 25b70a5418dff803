// libs/scheduling-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::models::{DayOfWeek, SchedulingError, TimeSlot};
use crate::services::availability::intervals_overlap;
use crate::store::{SchedulingStore, StoreData};

/// Derives the ordered sequence of bookable time slots from a doctor's
/// recurring schedule and the active appointments already on the books.
/// Pure over stored state: no writes, identical results on repeated calls.
pub struct SlotGeneratorService {
    store: Arc<SchedulingStore>,
}

impl SlotGeneratorService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    /// Slots for a single date. No schedule for that weekday, or a disabled
    /// one, yields an empty sequence.
    pub async fn generate_slots(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        date: NaiveDate,
    ) -> Vec<TimeSlot> {
        let data = self.store.read().await;
        slots_for_date(&data, doctor_id, clinic_id, date)
    }

    /// Date-by-date concatenation over the inclusive [date_from, date_to]
    /// range, computed against one consistent snapshot of the store.
    pub async fn generate_slots_in_range(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        if date_to < date_from {
            return Err(SchedulingError::Validation(
                "date_from must not be after date_to".to_string(),
            ));
        }

        let data = self.store.read().await;
        let mut slots = Vec::new();
        let mut date = date_from;
        loop {
            slots.extend(slots_for_date(&data, doctor_id, clinic_id, date));
            if date >= date_to {
                break;
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        debug!(
            "Generated {} slots for doctor {} at clinic {} between {} and {}",
            slots.len(),
            doctor_id,
            clinic_id,
            date_from,
            date_to
        );
        Ok(slots)
    }
}

/// Slot derivation for one date against a store snapshot. Steps from the
/// schedule's start time by its slot duration, emitting [t, t + duration)
/// while t + duration fits inside the window, and dropping any candidate
/// that overlaps an active appointment on that date.
fn slots_for_date(
    data: &StoreData,
    doctor_id: Uuid,
    clinic_id: Uuid,
    date: NaiveDate,
) -> Vec<TimeSlot> {
    let day_of_week = DayOfWeek::from_date(date);
    let schedule = match data.schedule_for(doctor_id, clinic_id, day_of_week) {
        Some(schedule) if schedule.is_available => schedule,
        _ => return Vec::new(),
    };
    if schedule.end_time <= schedule.start_time || schedule.slot_duration_minutes <= 0 {
        return Vec::new();
    }

    let window_start = date.and_time(schedule.start_time).and_utc();
    let window_end = date.and_time(schedule.end_time).and_utc();
    let step = Duration::minutes(schedule.slot_duration_minutes as i64);

    let existing = data.active_appointments_on(doctor_id, clinic_id, date, None);

    let mut slots = Vec::new();
    let mut current = window_start;
    while current + step <= window_end {
        let slot_end = current + step;
        let taken = existing.iter().any(|appointment| {
            intervals_overlap(
                current,
                slot_end,
                appointment.appointment_start,
                appointment.scheduled_end_time(),
            )
        });
        if !taken {
            slots.push(TimeSlot {
                date,
                start: current,
                end: slot_end,
            });
        }
        current = slot_end;
    }

    slots
}
