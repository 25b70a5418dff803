// libs/scheduling-cell/tests/schedule_store_test.rs
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    CreateScheduleRequest, DayOfWeek, SchedulingError, UpdateScheduleRequest,
};

mod common;
use common::{monday_at, patient_caller, time, TestClinic};

#[tokio::test]
async fn create_schedule_rejects_duplicate_day() {
    let clinic = TestClinic::with_monday_schedule().await;

    let result = clinic
        .schedules()
        .create_schedule(CreateScheduleRequest {
            doctor_id: clinic.doctor_id,
            clinic_id: clinic.clinic_id,
            day_of_week: DayOfWeek::Monday,
            start_time: time(9, 0),
            end_time: time(12, 0),
            slot_duration_minutes: None,
            is_available: None,
        })
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn create_schedule_rejects_inverted_times() {
    let clinic = TestClinic::empty();

    let result = clinic
        .schedules()
        .create_schedule(CreateScheduleRequest {
            doctor_id: clinic.doctor_id,
            clinic_id: clinic.clinic_id,
            day_of_week: DayOfWeek::Monday,
            start_time: time(18, 0),
            end_time: time(8, 0),
            slot_duration_minutes: None,
            is_available: None,
        })
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn create_schedule_defaults_to_thirty_minute_slots() {
    let clinic = TestClinic::empty();

    let schedule = clinic
        .schedules()
        .create_schedule(CreateScheduleRequest {
            doctor_id: clinic.doctor_id,
            clinic_id: clinic.clinic_id,
            day_of_week: DayOfWeek::Friday,
            start_time: time(8, 0),
            end_time: time(12, 0),
            slot_duration_minutes: None,
            is_available: None,
        })
        .await
        .unwrap();

    assert_eq!(schedule.slot_duration_minutes, 30);
    assert!(schedule.is_available);
}

#[tokio::test]
async fn update_can_move_day_when_no_appointments_exist() {
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();

    let updated = clinic
        .schedules()
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                day_of_week: Some(DayOfWeek::Wednesday),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.day_of_week, DayOfWeek::Wednesday);
}

#[tokio::test]
async fn update_to_occupied_day_conflicts() {
    let clinic = TestClinic::with_monday_schedule().await;
    let tuesday_schedule = clinic
        .create_schedule(DayOfWeek::Tuesday, time(8, 0), time(18, 0), 30)
        .await;

    let result = clinic
        .schedules()
        .update_schedule(
            tuesday_schedule.id,
            UpdateScheduleRequest {
                day_of_week: Some(DayOfWeek::Monday),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn disabling_schedule_with_active_appointment_is_refused() {
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();
    clinic.book(Uuid::new_v4(), monday_at(10, 0)).await;

    let patched = clinic
        .schedules()
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(patched, Err(SchedulingError::Conflict(_)));

    let toggled = clinic.schedules().toggle_availability(schedule.id).await;
    assert_matches!(toggled, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn moving_day_with_active_appointment_is_refused() {
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();
    clinic.book(Uuid::new_v4(), monday_at(9, 0)).await;

    let result = clinic
        .schedules()
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                day_of_week: Some(DayOfWeek::Thursday),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn changing_slot_duration_is_allowed_despite_active_appointments() {
    // Duration edits do not re-key or disable the schedule, so existing
    // appointments (with their snapshotted durations) do not block them.
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();
    clinic.book(Uuid::new_v4(), monday_at(10, 0)).await;

    let updated = clinic
        .schedules()
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                slot_duration_minutes: Some(45),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.slot_duration_minutes, 45);
}

#[tokio::test]
async fn delete_schedule_guard_lifts_once_appointments_are_cancelled() {
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();
    let patient_id = Uuid::new_v4();
    let appointment = clinic.book(patient_id, monday_at(10, 0)).await;

    let refused = clinic.schedules().delete_schedule(schedule.id).await;
    assert_matches!(refused, Err(SchedulingError::Conflict(_)));

    clinic
        .lifecycle()
        .cancel(appointment.id, None, &patient_caller(patient_id))
        .await
        .unwrap();

    clinic.schedules().delete_schedule(schedule.id).await.unwrap();
    assert!(clinic.schedules().list_schedules(None, None).await.is_empty());
}

#[tokio::test]
async fn delete_guard_counts_past_weekday_appointments() {
    // The guard matches by weekday on any date, past included.
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();

    // 2024-06-17 is a Monday in the past.
    let past_monday = Utc.with_ymd_and_hms(2024, 6, 17, 10, 0, 0).unwrap();
    clinic.book(Uuid::new_v4(), past_monday).await;

    let result = clinic.schedules().delete_schedule(schedule.id).await;
    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn toggle_round_trips_when_idle() {
    let clinic = TestClinic::with_monday_schedule().await;
    let schedule = clinic.schedules().list_schedules(None, None).await[0].clone();

    let off = clinic.schedules().toggle_availability(schedule.id).await.unwrap();
    assert!(!off.is_available);

    let on = clinic.schedules().toggle_availability(schedule.id).await.unwrap();
    assert!(on.is_available);
}

#[tokio::test]
async fn unknown_schedule_is_not_found() {
    let clinic = TestClinic::empty();

    let result = clinic.schedules().delete_schedule(Uuid::new_v4()).await;
    assert_matches!(result, Err(SchedulingError::NotFound(_)));
}
