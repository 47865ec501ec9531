use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable clinical service (e.g. "General Medicine").
///
/// `voided` is a soft flag: voided services stay stored, but appointments
/// referencing them disappear from every listing and search path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicService {
    pub id: Uuid,
    pub name: String,
    pub voided: bool,
}

/// A variant of a service (e.g. "New Patient" vs "Follow-up").
/// Must belong to the service an appointment references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub duration_mins: Option<i64>,
    pub voided: bool,
}
