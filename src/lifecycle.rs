//! Appointment lifecycle engine.
//!
//! Composes the access guard, the validator pipelines, and the audit trail
//! into the three mutation operations (create, change status, undo) plus the
//! read surface. Each mutation persists the appointment and appends exactly
//! one audit record inside a single transaction, so the pair is
//! all-or-nothing. Undo is compensating: it appends a new forward record and
//! never deletes history.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::authorization::{
    self, Principal, MANAGE_APPOINTMENTS, PRIVILEGES_REQUIRED_CODE, RESET_APPOINTMENT_STATUS,
    VIEW_APPOINTMENTS,
};
use crate::db::repository::{
    appointments_for_service, appointments_in_range, find_appointment_by_external_id,
    future_appointments_for_service, future_appointments_for_service_type, list_appointments,
    prior_status_change_event, record_audit_event, save_appointment, search_appointments,
    voided_references,
};
use crate::db::DatabaseError;
use crate::models::{
    instant_to_string, Appointment, AppointmentSearch, AppointmentStatus,
};
use crate::validation::{
    run_appointment_validators, run_status_change_validators, AppointmentValidator,
    ServiceReferenceValidator, StatusChangeValidator, TimingValidator,
};

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

/// Errors surfaced by lifecycle operations. Each variant is distinguishable
/// so adapters can map them to distinct transport codes.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Guard or reset-gate denial; carries the missing privilege name.
    #[error("insufficient privileges: {privilege} required")]
    Authorization { privilege: &'static str },

    /// Every message the validator pipeline collected, newline-joined.
    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("no status change actions to undo")]
    NothingToUndo,

    /// Target status string did not parse against the status enumeration.
    #[error("unknown appointment status: {0}")]
    InvalidStatus(String),

    /// Storage failure, propagated unchanged; never retried here.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl LifecycleError {
    /// Message-lookup code for privilege denials, for adapters that localize.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            LifecycleError::Authorization { .. } => Some(PRIVILEGES_REQUIRED_CODE),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════

/// Snapshot written into the creation audit record, for compliance review
/// independent of later mutation.
#[derive(Serialize)]
struct CreationSnapshot<'a> {
    service_id: String,
    service_type_id: Option<String>,
    provider_id: Option<String>,
    location_id: Option<String>,
    start_time: String,
    end_time: String,
    kind: &'a str,
    comments: Option<&'a str>,
}

impl<'a> CreationSnapshot<'a> {
    fn of(appointment: &'a Appointment) -> Self {
        Self {
            service_id: appointment.service_id.to_string(),
            service_type_id: appointment.service_type_id.map(|u| u.to_string()),
            provider_id: appointment.provider_id.map(|u| u.to_string()),
            location_id: appointment.location_id.map(|u| u.to_string()),
            start_time: instant_to_string(&appointment.start_time),
            end_time: instant_to_string(&appointment.end_time),
            kind: appointment.kind.as_str(),
            comments: appointment.comments.as_deref(),
        }
    }
}

/// The lifecycle engine. Holds the two validator pipelines, injected at
/// construction as ordered sequences of trait objects.
pub struct AppointmentLifecycle {
    appointment_validators: Vec<Box<dyn AppointmentValidator>>,
    status_change_validators: Vec<Box<dyn StatusChangeValidator>>,
}

impl AppointmentLifecycle {
    pub fn new(
        appointment_validators: Vec<Box<dyn AppointmentValidator>>,
        status_change_validators: Vec<Box<dyn StatusChangeValidator>>,
    ) -> Self {
        Self { appointment_validators, status_change_validators }
    }

    /// Engine with the built-in creation rules and no status-change rules;
    /// deployments append their own.
    pub fn with_default_validators() -> Self {
        Self::new(
            vec![Box::new(TimingValidator), Box::new(ServiceReferenceValidator)],
            Vec::new(),
        )
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Validate and persist a new (or edited) appointment, and append its
    /// creation audit record carrying a JSON snapshot of the key references
    /// and timestamps.
    pub fn create_and_save(
        &self,
        conn: &mut Connection,
        principal: &Principal,
        mut appointment: Appointment,
    ) -> Result<Appointment, LifecycleError> {
        require_manage(conn, principal, &appointment)?;

        let errors = run_appointment_validators(&self.appointment_validators, conn, &appointment);
        if !errors.is_empty() {
            return Err(LifecycleError::Validation(errors));
        }

        let snapshot = serde_json::to_string(&CreationSnapshot::of(&appointment))
            .map_err(|e| DatabaseError::ConstraintViolation(format!("snapshot serialization: {e}")))?;

        let tx = conn.transaction().map_err(DatabaseError::from)?;
        save_appointment(&tx, &mut appointment)?;
        record_audit_event(&tx, &appointment, Some(snapshot.as_str()))?;
        tx.commit().map_err(DatabaseError::from)?;

        debug!(appointment = %appointment.external_id, "appointment created");
        Ok(appointment)
    }

    /// Parse the target status, run the guards and the status-change
    /// pipeline, then mutate the status in place, persist, and append one
    /// audit record. `on_date` becomes the record's notes, rendered as an
    /// instant string; absent when not supplied.
    pub fn change_status(
        &self,
        conn: &mut Connection,
        principal: &Principal,
        appointment: &mut Appointment,
        status: &str,
        on_date: Option<DateTime<Utc>>,
    ) -> Result<(), LifecycleError> {
        let target = AppointmentStatus::from_str(status)
            .map_err(|_| LifecycleError::InvalidStatus(status.to_string()))?;

        require_manage(conn, principal, appointment)?;
        if !authorization::may_reset_status(principal, &target) {
            return Err(LifecycleError::Authorization { privilege: RESET_APPOINTMENT_STATUS });
        }

        let errors = run_status_change_validators(
            &self.status_change_validators,
            conn,
            appointment,
            &target,
        );
        if !errors.is_empty() {
            return Err(LifecycleError::Validation(errors));
        }

        let from = appointment.status.clone();
        appointment.status = target;
        let notes = on_date.map(|d| instant_to_string(&d));

        let tx = conn.transaction().map_err(DatabaseError::from)?;
        save_appointment(&tx, appointment)?;
        record_audit_event(&tx, appointment, notes.as_deref())?;
        tx.commit().map_err(DatabaseError::from)?;

        debug!(
            appointment = %appointment.external_id,
            from = from.as_str(),
            to = appointment.status.as_str(),
            "appointment status changed"
        );
        Ok(())
    }

    /// Revert the most recent status change by appending a compensating
    /// record: status and notes are restored from the audit entry
    /// immediately preceding the current state.
    pub fn undo_status_change(
        &self,
        conn: &mut Connection,
        principal: &Principal,
        appointment: &mut Appointment,
    ) -> Result<(), LifecycleError> {
        require_manage(conn, principal, appointment)?;

        let prior = prior_status_change_event(conn, appointment)?
            .ok_or(LifecycleError::NothingToUndo)?;

        appointment.status = prior.status.clone();

        let tx = conn.transaction().map_err(DatabaseError::from)?;
        save_appointment(&tx, appointment)?;
        record_audit_event(&tx, appointment, prior.notes.as_deref())?;
        tx.commit().map_err(DatabaseError::from)?;

        debug!(
            appointment = %appointment.external_id,
            restored = appointment.status.as_str(),
            "appointment status change undone"
        );
        Ok(())
    }

    // ─── Reads ───────────────────────────────────────────────────────────────
    // Every listing/search path uniformly drops appointments whose service or
    // service type has been voided. Direct lookup by external id does not.

    pub fn all_appointments(
        &self,
        conn: &Connection,
        principal: &Principal,
        for_date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, LifecycleError> {
        require_view(principal)?;
        strip_voided(conn, list_appointments(conn, for_date)?)
    }

    pub fn appointments_in_date_range(
        &self,
        conn: &Connection,
        principal: &Principal,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<Appointment>, LifecycleError> {
        require_view(principal)?;
        strip_voided(conn, appointments_in_range(conn, start, end)?)
    }

    pub fn appointments_for_service(
        &self,
        conn: &Connection,
        principal: &Principal,
        service_id: &Uuid,
        start: Option<&DateTime<Utc>>,
        end: Option<&DateTime<Utc>>,
        statuses: Option<&[AppointmentStatus]>,
    ) -> Result<Vec<Appointment>, LifecycleError> {
        require_view(principal)?;
        strip_voided(
            conn,
            appointments_for_service(conn, service_id, start, end, statuses)?,
        )
    }

    pub fn future_appointments_for_service(
        &self,
        conn: &Connection,
        principal: &Principal,
        service_id: &Uuid,
        after: &DateTime<Utc>,
    ) -> Result<Vec<Appointment>, LifecycleError> {
        require_view(principal)?;
        strip_voided(conn, future_appointments_for_service(conn, service_id, after)?)
    }

    pub fn future_appointments_for_service_type(
        &self,
        conn: &Connection,
        principal: &Principal,
        service_type_id: &Uuid,
        after: &DateTime<Utc>,
    ) -> Result<Vec<Appointment>, LifecycleError> {
        require_view(principal)?;
        strip_voided(
            conn,
            future_appointments_for_service_type(conn, service_type_id, after)?,
        )
    }

    /// Direct lookup; returns the appointment even when its service was
    /// voided since, so callers can still inspect historical records.
    pub fn appointment_by_external_id(
        &self,
        conn: &Connection,
        principal: &Principal,
        external_id: &Uuid,
    ) -> Result<Option<Appointment>, LifecycleError> {
        require_view(principal)?;
        Ok(find_appointment_by_external_id(conn, external_id)?)
    }

    /// Search over the descriptor. Yields `None` — an absent result, not an
    /// error — when either date bound is missing. Callers that consider a
    /// missing bound a caller error must map `None` themselves.
    pub fn search(
        &self,
        conn: &Connection,
        principal: &Principal,
        search: &AppointmentSearch,
    ) -> Result<Option<Vec<Appointment>>, LifecycleError> {
        require_view(principal)?;
        if search.start_date.is_none() || search.end_date.is_none() {
            return Ok(None);
        }
        let rows = search_appointments(conn, search)?;
        strip_voided(conn, rows).map(Some)
    }
}

// ─── Guard helpers ────────────────────────────────────────────────────────────

fn require_manage(
    conn: &Connection,
    principal: &Principal,
    appointment: &Appointment,
) -> Result<(), LifecycleError> {
    let decision = authorization::may_manage(conn, principal, appointment)?;
    if !decision.allowed {
        return Err(LifecycleError::Authorization { privilege: MANAGE_APPOINTMENTS });
    }
    Ok(())
}

fn require_view(principal: &Principal) -> Result<(), LifecycleError> {
    if !authorization::may_view(principal) {
        return Err(LifecycleError::Authorization { privilege: VIEW_APPOINTMENTS });
    }
    Ok(())
}

fn strip_voided(
    conn: &Connection,
    appointments: Vec<Appointment>,
) -> Result<Vec<Appointment>, LifecycleError> {
    let voided = voided_references(conn)?;
    Ok(appointments
        .into_iter()
        .filter(|a| !voided.excludes(a))
        .collect())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
