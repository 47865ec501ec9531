//! Appointment access authorization.
//!
//! Two privilege tiers gate the mutation surface:
//! 1. "Manage Appointments" → may act on ANY appointment
//! 2. "Manage Own Appointments" → may act only when the appointment is
//!    unassigned or assigned to the acting principal's own person
//! 3. Neither → DENY
//!
//! Identity is compared by underlying person, not by provider record.
//! Transitions *to* `Scheduled` carry an additional, independent gate:
//! "Reset Appointment Status". Reads are gated by "View Appointments".

use std::collections::HashSet;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::provider_person_id;
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus};

pub const MANAGE_APPOINTMENTS: &str = "Manage Appointments";
pub const MANAGE_OWN_APPOINTMENTS: &str = "Manage Own Appointments";
pub const RESET_APPOINTMENT_STATUS: &str = "Reset Appointment Status";
pub const VIEW_APPOINTMENTS: &str = "View Appointments";

/// Message-lookup code adapters use when rendering privilege denials.
pub const PRIVILEGES_REQUIRED_CODE: &str = "error.privilegesRequired";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The authenticated actor invoking an operation.
///
/// Threaded explicitly through every lifecycle call; there is no ambient
/// session state in this crate.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub person_id: Uuid,
    privileges: HashSet<String>,
}

impl Principal {
    pub fn new<I, S>(user_id: Uuid, person_id: Uuid, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id,
            person_id,
            privileges: privileges.into_iter().map(Into::into).collect(),
        }
    }

    /// Privileges are checked by name.
    pub fn has_privilege(&self, name: &str) -> bool {
        self.privileges.contains(name)
    }
}

/// Why access was granted (or denied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessReason {
    /// Principal holds the broad manage privilege.
    BroadPrivilege,
    /// Own-tier principal acting on an appointment with no assigned provider.
    UnassignedProvider,
    /// Own-tier principal acting on their own appointment (or the assigned
    /// provider has no linked person to conflict with).
    OwnAppointment,
    /// No matching rule — access denied.
    Denied,
}

/// Result of an authorization check.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self { allowed: true, reason }
    }

    fn deny() -> Self {
        Self { allowed: false, reason: AccessReason::Denied }
    }
}

// ═══════════════════════════════════════════════════════════
// Authorization checks
// ═══════════════════════════════════════════════════════════

/// Check whether a principal may create or modify the given appointment.
///
/// Cascade, checked in order:
/// 1. Broad "Manage Appointments" → ALLOW
/// 2. "Manage Own Appointments": no assigned provider → ALLOW; assigned
///    provider's person matches (or is unlinked) → ALLOW; otherwise DENY
/// 3. Neither manage privilege → DENY
pub fn may_manage(
    conn: &Connection,
    principal: &Principal,
    appointment: &Appointment,
) -> Result<AccessDecision, DatabaseError> {
    if principal.has_privilege(MANAGE_APPOINTMENTS) {
        return Ok(AccessDecision::allow(AccessReason::BroadPrivilege));
    }
    if !principal.has_privilege(MANAGE_OWN_APPOINTMENTS) {
        return Ok(AccessDecision::deny());
    }

    let Some(provider_id) = appointment.provider_id else {
        return Ok(AccessDecision::allow(AccessReason::UnassignedProvider));
    };
    match provider_person_id(conn, &provider_id)? {
        Some(person) if person != principal.person_id => Ok(AccessDecision::deny()),
        _ => Ok(AccessDecision::allow(AccessReason::OwnAppointment)),
    }
}

/// Independent gate for the status-reset transition: assigning any status
/// other than `Scheduled` needs no extra privilege; assigning `Scheduled`
/// requires "Reset Appointment Status" even when manage is held.
pub fn may_reset_status(principal: &Principal, target: &AppointmentStatus) -> bool {
    *target != AppointmentStatus::Scheduled
        || principal.has_privilege(RESET_APPOINTMENT_STATUS)
}

/// "View Appointments" gate for the read surface.
pub fn may_view(principal: &Principal) -> bool {
    principal.has_privilege(VIEW_APPOINTMENTS)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_provider;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{AppointmentKind, Provider};
    use chrono::{TimeZone, Utc};

    fn appointment(provider_id: Option<Uuid>) -> Appointment {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap();
        let mut appt = Appointment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            start,
            end,
            AppointmentKind::Scheduled,
        );
        appt.provider_id = provider_id;
        appt
    }

    fn provider_for(conn: &Connection, person_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        insert_provider(conn, &Provider { id, person_id, name: "Dr. Chen".into() }).unwrap();
        id
    }

    fn principal(privileges: &[&str]) -> Principal {
        Principal::new(Uuid::new_v4(), Uuid::new_v4(), privileges.iter().copied())
    }

    // ── Rule 1: broad privilege ──────────────────────────

    #[test]
    fn broad_privilege_manages_any_appointment() {
        let conn = open_memory_database().unwrap();
        let provider = provider_for(&conn, Some(Uuid::new_v4()));
        let who = principal(&[MANAGE_APPOINTMENTS]);

        let decision = may_manage(&conn, &who, &appointment(Some(provider))).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::BroadPrivilege);
    }

    // ── Rule 2: manage-own tier ──────────────────────────

    #[test]
    fn own_tier_allows_unassigned_appointment() {
        let conn = open_memory_database().unwrap();
        let who = principal(&[MANAGE_OWN_APPOINTMENTS]);

        let decision = may_manage(&conn, &who, &appointment(None)).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::UnassignedProvider);
    }

    #[test]
    fn own_tier_allows_own_person() {
        let conn = open_memory_database().unwrap();
        let who = principal(&[MANAGE_OWN_APPOINTMENTS]);
        let provider = provider_for(&conn, Some(who.person_id));

        let decision = may_manage(&conn, &who, &appointment(Some(provider))).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::OwnAppointment);
    }

    #[test]
    fn own_tier_denies_other_person() {
        let conn = open_memory_database().unwrap();
        let who = principal(&[MANAGE_OWN_APPOINTMENTS]);
        let provider = provider_for(&conn, Some(Uuid::new_v4()));

        let decision = may_manage(&conn, &who, &appointment(Some(provider))).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, AccessReason::Denied);
    }

    #[test]
    fn own_tier_allows_provider_without_linked_person() {
        let conn = open_memory_database().unwrap();
        let who = principal(&[MANAGE_OWN_APPOINTMENTS]);
        let provider = provider_for(&conn, None);

        let decision = may_manage(&conn, &who, &appointment(Some(provider))).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::OwnAppointment);
    }

    // ── Rule 3: no manage privilege ──────────────────────

    #[test]
    fn no_manage_privilege_is_denied() {
        let conn = open_memory_database().unwrap();
        let who = principal(&[VIEW_APPOINTMENTS]);

        let decision = may_manage(&conn, &who, &appointment(None)).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, AccessReason::Denied);
    }

    // ── Reset gate ───────────────────────────────────────

    #[test]
    fn reset_gate_applies_only_to_scheduled_target() {
        let manager = principal(&[MANAGE_APPOINTMENTS]);
        assert!(may_reset_status(&manager, &AppointmentStatus::Completed));
        assert!(may_reset_status(&manager, &AppointmentStatus::Missed));
        assert!(!may_reset_status(&manager, &AppointmentStatus::Scheduled));

        let resetter = principal(&[MANAGE_APPOINTMENTS, RESET_APPOINTMENT_STATUS]);
        assert!(may_reset_status(&resetter, &AppointmentStatus::Scheduled));
    }

    // ── View gate ────────────────────────────────────────

    #[test]
    fn view_gate_checks_by_name() {
        assert!(may_view(&principal(&[VIEW_APPOINTMENTS])));
        assert!(!may_view(&principal(&[MANAGE_APPOINTMENTS])));
    }
}
