use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinician who can be assigned to appointments.
///
/// `person_id` links the provider record to the underlying person identity;
/// the access guard compares persons, not provider records. It may be absent
/// for provider records not yet linked to a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub person_id: Option<Uuid>,
    pub name: String,
}
