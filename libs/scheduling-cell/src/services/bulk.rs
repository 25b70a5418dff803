// libs/scheduling-cell/src/services/bulk.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::auth::CallerIdentity;

use crate::models::{BulkResult, SchedulingError};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::SchedulingStore;

/// Drives multi-appointment cancel/reschedule requests through the lifecycle
/// service, one appointment at a time in ascending id order.
///
/// The batch as a whole is deliberately not atomic: partial failure is the
/// designed outcome, with per-item errors collected in the result. Each
/// individual item still gets the lifecycle's atomic check-and-commit.
pub struct BulkOperationsService {
    store: Arc<SchedulingStore>,
    lifecycle: AppointmentLifecycleService,
}

impl BulkOperationsService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self {
            lifecycle: AppointmentLifecycleService::new(store.clone()),
            store,
        }
    }

    /// Attempt to cancel each of the given appointments. Unknown ids are
    /// silently absent from the result; transition failures are recorded
    /// per id. `reason` is persisted on each successfully cancelled one.
    pub async fn bulk_cancel(
        &self,
        appointment_ids: Vec<Uuid>,
        reason: Option<String>,
        caller: &CallerIdentity,
    ) -> BulkResult {
        let mut ids = appointment_ids;
        ids.sort();
        ids.dedup();
        debug!("Bulk cancelling {} appointments", ids.len());

        let mut result = BulkResult::default();
        for id in ids {
            match self.lifecycle.cancel(id, reason.clone(), caller).await {
                Ok(_) => result.record_success(),
                Err(SchedulingError::NotFound(_)) => {}
                Err(err) => result.record_failure(id, err.to_string()),
            }
        }

        info!(
            "Bulk cancel finished: {} succeeded, {} failed",
            result.succeeded, result.failed
        );
        result
    }

    /// Find every active appointment for (doctor, clinic) with a date in the
    /// inclusive [date_from, date_to] range and sequentially attempt to move
    /// each to the same target slot. Because each successful reschedule
    /// occupies the target, at most one appointment per invocation lands on
    /// it; the rest fail the overlap check and stay where they were.
    pub async fn bulk_reschedule_conflicts(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        date_from: NaiveDate,
        date_to: NaiveDate,
        new_date: NaiveDate,
        new_time: NaiveTime,
        caller: &CallerIdentity,
    ) -> Result<BulkResult, SchedulingError> {
        if date_to < date_from {
            return Err(SchedulingError::Validation(
                "date_from must not be after date_to".to_string(),
            ));
        }

        let ids: Vec<Uuid> = {
            let data = self.store.read().await;
            data.active_appointments_in_range(doctor_id, clinic_id, date_from, date_to)
                .iter()
                .map(|appointment| appointment.id)
                .collect()
        };
        debug!(
            "Bulk rescheduling {} appointments for doctor {} to {} {}",
            ids.len(),
            doctor_id,
            new_date,
            new_time
        );

        let mut result = BulkResult::default();
        for id in ids {
            match self.lifecycle.reschedule(id, new_date, new_time, caller).await {
                Ok(_) => result.record_success(),
                Err(SchedulingError::NotFound(_)) => {}
                Err(err) => result.record_failure(id, err.to_string()),
            }
        }

        info!(
            "Bulk reschedule finished: {} succeeded, {} failed",
            result.succeeded, result.failed
        );
        Ok(result)
    }
}
