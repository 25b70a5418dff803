// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::CallerIdentity;
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, BulkCancelRequest, BulkOutcome, BulkRescheduleRequest, BulkResult,
    CancelAppointmentRequest, CreateScheduleRequest, RescheduleAppointmentRequest,
    UpdateScheduleRequest,
};
use crate::services::bulk::BulkOperationsService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::schedule::ScheduleService;
use crate::services::slots::SlotGeneratorService;
use crate::store::SchedulingStore;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub doctor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlotListQuery {
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

fn require_elevated(caller: &CallerIdentity) -> Result<(), AppError> {
    if caller.role.is_elevated() {
        Ok(())
    } else {
        Err(AppError::Auth(
            "only clinic staff may perform this operation".to_string(),
        ))
    }
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_schedule(
    State(store): State<Arc<SchedulingStore>>,
    caller: CallerIdentity,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = ScheduleService::new(store);
    let schedule = service.create_schedule(request).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule
    })))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(store): State<Arc<SchedulingStore>>,
    Path(schedule_id): Path<Uuid>,
    caller: CallerIdentity,
    Json(patch): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = ScheduleService::new(store);
    let schedule = service.update_schedule(schedule_id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule
    })))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(store): State<Arc<SchedulingStore>>,
    Path(schedule_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = ScheduleService::new(store);
    service.delete_schedule(schedule_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule deleted"
    })))
}

#[axum::debug_handler]
pub async fn toggle_schedule_availability(
    State(store): State<Arc<SchedulingStore>>,
    Path(schedule_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = ScheduleService::new(store);
    let schedule = service.toggle_availability(schedule_id).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule
    })))
}

#[axum::debug_handler]
pub async fn list_schedules(
    State(store): State<Arc<SchedulingStore>>,
    _caller: CallerIdentity,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(store);
    let schedules = service.list_schedules(query.doctor_id, query.clinic_id).await;

    Ok(Json(json!({
        "success": true,
        "schedules": schedules
    })))
}

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_available_slots(
    State(store): State<Arc<SchedulingStore>>,
    _caller: CallerIdentity,
    Query(query): Query<SlotListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SlotGeneratorService::new(store);
    let slots = service
        .generate_slots_in_range(query.doctor_id, query.clinic_id, query.date_from, query.date_to)
        .await?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(store): State<Arc<SchedulingStore>>,
    caller: CallerIdentity,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if !caller.can_manage(request.patient_id) {
        return Err(AppError::Auth(
            "not authorized to book an appointment for this patient".to_string(),
        ));
    }

    let service = AppointmentLifecycleService::new(store);
    let appointment = service.create_appointment(request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(store);
    let appointment = service.get_appointment(appointment_id).await?;

    let is_patient = appointment.patient_id == caller.user_id;
    let is_doctor = appointment.doctor_id == caller.user_id;
    if !is_patient && !is_doctor && !caller.role.is_elevated() {
        return Err(AppError::Auth(
            "not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment_by_code(
    State(store): State<Arc<SchedulingStore>>,
    Path(public_code): Path<String>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(store);
    let appointment = service.get_by_public_code(&public_code).await?;

    if appointment.patient_id != caller.user_id && !caller.role.is_elevated() {
        return Err(AppError::Auth(
            "not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = AppointmentLifecycleService::new(store);
    let appointment = service.confirm(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    require_elevated(&caller)?;

    let service = AppointmentLifecycleService::new(store);
    let appointment = service.complete(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(store);
    let appointment = service
        .cancel(appointment_id, request.reason, &caller)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(store);
    let appointment = service
        .reschedule(appointment_id, request.new_date, request.new_time, &caller)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled and awaiting confirmation"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    caller: CallerIdentity,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(store);
    service.delete_appointment(appointment_id, &caller).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted"
    })))
}

// ==============================================================================
// BULK OPERATION HANDLERS
// ==============================================================================

fn bulk_response(result: BulkResult) -> Response {
    let status = match result.outcome() {
        BulkOutcome::FullSuccess => StatusCode::OK,
        BulkOutcome::PartialSuccess => StatusCode::MULTI_STATUS,
        BulkOutcome::Failure => StatusCode::CONFLICT,
    };
    (status, Json(json!(result))).into_response()
}

#[axum::debug_handler]
pub async fn bulk_cancel_appointments(
    State(store): State<Arc<SchedulingStore>>,
    caller: CallerIdentity,
    Json(request): Json<BulkCancelRequest>,
) -> Result<Response, AppError> {
    let service = BulkOperationsService::new(store);
    let result = service
        .bulk_cancel(request.appointment_ids, request.reason, &caller)
        .await;

    Ok(bulk_response(result))
}

#[axum::debug_handler]
pub async fn bulk_reschedule_conflicts(
    State(store): State<Arc<SchedulingStore>>,
    caller: CallerIdentity,
    Json(request): Json<BulkRescheduleRequest>,
) -> Result<Response, AppError> {
    require_elevated(&caller)?;

    let service = BulkOperationsService::new(store);
    let result = service
        .bulk_reschedule_conflicts(
            request.doctor_id,
            request.clinic_id,
            request.date_from,
            request.date_to,
            request.new_date,
            request.new_time,
            &caller,
        )
        .await?;

    Ok(bulk_response(result))
}
