use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Role of the authenticated caller, as asserted by the upstream auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    /// Doctors and admins may act on appointments they do not own.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Doctor | Role::Admin)
    }
}

/// Identity of the caller making a request. Authentication itself happens
/// upstream; this service trusts the gateway-injected headers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub role: Role,
}

impl CallerIdentity {
    /// Whether this caller may mutate an appointment owned by `patient_id`.
    pub fn can_manage(&self, patient_id: Uuid) -> bool {
        self.user_id == patient_id || self.role.is_elevated()
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| AppError::Auth("missing or invalid x-user-id header".to_string()))?;

        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
        {
            Some("admin") => Role::Admin,
            Some("doctor") => Role::Doctor,
            _ => Role::Patient,
        };

        Ok(CallerIdentity { user_id, role })
    }
}
