use chrono::{DateTime, ParseError, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentKind, AppointmentStatus};

/// A booked encounter between a patient and (optionally) a provider.
///
/// `id` is the surrogate row id, assigned on first save. `external_id` is the
/// globally unique identifier handed to outer layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Option<i64>,
    pub external_id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Uuid,
    pub service_type_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
    pub comments: Option<String>,
}

impl Appointment {
    /// New unsaved appointment in the initial `Scheduled` status.
    pub fn new(
        patient_id: Uuid,
        service_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        kind: AppointmentKind,
    ) -> Self {
        Self {
            id: None,
            external_id: Uuid::new_v4(),
            patient_id,
            provider_id: None,
            service_id,
            service_type_id: None,
            location_id: None,
            start_time,
            end_time,
            kind,
            status: AppointmentStatus::Scheduled,
            comments: None,
        }
    }
}

/// One immutable entry in an appointment's audit trail.
///
/// Written exactly once per successful create, status change, or undo.
/// `notes` holds a JSON snapshot at creation time, or the caller-supplied
/// effective instant on a transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentAudit {
    pub id: Option<i64>,
    pub appointment_id: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fixed round-trippable instant form used for storage and audit notes.
///
/// Always UTC with microsecond precision, so the stored strings compare
/// lexicographically in chronological order.
pub fn instant_to_string(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Inverse of [`instant_to_string`]; also accepts any RFC 3339 instant.
pub fn instant_from_string(s: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_appointment_starts_scheduled() {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap();
        let appt = Appointment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            start,
            end,
            AppointmentKind::Scheduled,
        );
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert!(appt.id.is_none());
        assert!(appt.provider_id.is_none());
    }

    #[test]
    fn instant_format_round_trips() {
        let t = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let s = instant_to_string(&t);
        assert_eq!(s, "2026-03-10T09:00:00.000000Z");
        assert_eq!(instant_from_string(&s).unwrap(), t);
    }

    #[test]
    fn instant_format_orders_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        assert!(instant_to_string(&earlier) < instant_to_string(&later));
    }
}
