use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// Read-only search descriptor for the appointment listing surface.
///
/// Both date bounds are required: `lifecycle::AppointmentLifecycle::search`
/// yields an absent result (not an error) when either is missing.
#[derive(Debug, Clone, Default)]
pub struct AppointmentSearch {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}
