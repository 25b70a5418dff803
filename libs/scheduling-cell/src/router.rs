// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::store::SchedulingStore;

pub fn scheduling_routes(store: Arc<SchedulingStore>) -> Router {
    Router::new()
        // Doctor schedules
        .route(
            "/schedules",
            post(handlers::create_schedule).get(handlers::list_schedules),
        )
        .route(
            "/schedules/{schedule_id}",
            patch(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .route(
            "/schedules/{schedule_id}/toggle",
            post(handlers::toggle_schedule_availability),
        )
        // Appointments
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments/slots", get(handlers::list_available_slots))
        .route(
            "/appointments/by-code/{public_code}",
            get(handlers::get_appointment_by_code),
        )
        .route(
            "/appointments/bulk/cancel",
            post(handlers::bulk_cancel_appointments),
        )
        .route(
            "/appointments/bulk/reschedule-conflicts",
            post(handlers::bulk_reschedule_conflicts),
        )
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment).delete(handlers::delete_appointment),
        )
        .route(
            "/appointments/{appointment_id}/confirm",
            post(handlers::confirm_appointment),
        )
        .route(
            "/appointments/{appointment_id}/complete",
            post(handlers::complete_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/appointments/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .with_state(store)
}
