// libs/scheduling-cell/tests/common/mod.rs
//
// Shared fixtures: a clinic with one doctor and a Monday 08:00-18:00 schedule
// with 30-minute slots, plus caller identities for the authorization paths.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, BookAppointmentRequest, CreateScheduleRequest, DayOfWeek, Schedule,
};
use scheduling_cell::services::bulk::BulkOperationsService;
use scheduling_cell::services::lifecycle::AppointmentLifecycleService;
use scheduling_cell::services::schedule::ScheduleService;
use scheduling_cell::services::slots::SlotGeneratorService;
use scheduling_cell::store::SchedulingStore;
use shared_models::auth::{CallerIdentity, Role};

/// 2025-06-16 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

pub fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()
}

pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 16, hour, minute, 0).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn admin() -> CallerIdentity {
    CallerIdentity {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

pub fn patient_caller(patient_id: Uuid) -> CallerIdentity {
    CallerIdentity {
        user_id: patient_id,
        role: Role::Patient,
    }
}

pub struct TestClinic {
    pub store: Arc<SchedulingStore>,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
}

impl TestClinic {
    /// Store with no schedules yet.
    pub fn empty() -> Self {
        Self {
            store: Arc::new(SchedulingStore::new()),
            doctor_id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
        }
    }

    /// Store seeded with the standard Monday schedule.
    pub async fn with_monday_schedule() -> Self {
        let clinic = Self::empty();
        clinic
            .create_schedule(DayOfWeek::Monday, time(8, 0), time(18, 0), 30)
            .await;
        clinic
    }

    pub async fn create_schedule(
        &self,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
        slot_duration_minutes: i32,
    ) -> Schedule {
        self.schedules()
            .create_schedule(CreateScheduleRequest {
                doctor_id: self.doctor_id,
                clinic_id: self.clinic_id,
                day_of_week,
                start_time,
                end_time,
                slot_duration_minutes: Some(slot_duration_minutes),
                is_available: Some(true),
            })
            .await
            .expect("schedule fixture should be creatable")
    }

    pub fn schedules(&self) -> ScheduleService {
        ScheduleService::new(self.store.clone())
    }

    pub fn slots(&self) -> SlotGeneratorService {
        SlotGeneratorService::new(self.store.clone())
    }

    pub fn lifecycle(&self) -> AppointmentLifecycleService {
        AppointmentLifecycleService::new(self.store.clone())
    }

    pub fn bulk(&self) -> BulkOperationsService {
        BulkOperationsService::new(self.store.clone())
    }

    pub fn book_request(&self, patient_id: Uuid, start: DateTime<Utc>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id,
            doctor_id: self.doctor_id,
            clinic_id: self.clinic_id,
            appointment_start: start,
            appointment_type: None,
            reason: None,
            notes: None,
        }
    }

    pub async fn book(&self, patient_id: Uuid, start: DateTime<Utc>) -> Appointment {
        self.lifecycle()
            .create_appointment(self.book_request(patient_id, start))
            .await
            .expect("booking fixture should succeed")
    }
}
