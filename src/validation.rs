//! Pluggable validator pipelines for appointment creation and status change.
//!
//! Two independently configured, ordered pipelines. A validator never halts
//! the run: every validator executes and appends its messages to the shared
//! collector, so a caller sees all violated rules in one round trip. A
//! pipeline succeeds iff the collector is empty afterwards.

use rusqlite::Connection;

use crate::db::repository::{find_service, find_service_type};
use crate::models::{Appointment, AppointmentStatus};

/// One rule in the creation/edit pipeline. Implementations push a message
/// per violation; they do not return early and never abort the pipeline.
pub trait AppointmentValidator {
    fn validate(&self, conn: &Connection, appointment: &Appointment, errors: &mut Vec<String>);
}

/// One rule in the status-change pipeline.
pub trait StatusChangeValidator {
    fn validate(
        &self,
        conn: &Connection,
        appointment: &Appointment,
        target: &AppointmentStatus,
        errors: &mut Vec<String>,
    );
}

pub(crate) fn run_appointment_validators(
    validators: &[Box<dyn AppointmentValidator>],
    conn: &Connection,
    appointment: &Appointment,
) -> Vec<String> {
    let mut errors = Vec::new();
    for validator in validators {
        validator.validate(conn, appointment, &mut errors);
    }
    errors
}

pub(crate) fn run_status_change_validators(
    validators: &[Box<dyn StatusChangeValidator>],
    conn: &Connection,
    appointment: &Appointment,
    target: &AppointmentStatus,
) -> Vec<String> {
    let mut errors = Vec::new();
    for validator in validators {
        validator.validate(conn, appointment, target, &mut errors);
    }
    errors
}

// ─── Built-in creation rules ──────────────────────────────────────────────────

/// An appointment cannot end before it starts.
pub struct TimingValidator;

impl AppointmentValidator for TimingValidator {
    fn validate(&self, _conn: &Connection, appointment: &Appointment, errors: &mut Vec<String>) {
        if appointment.end_time < appointment.start_time {
            errors.push("Appointment cannot end before it starts".into());
        }
    }
}

/// The referenced service must exist and be active; the service type, when
/// present, must exist, be active, and belong to the referenced service.
pub struct ServiceReferenceValidator;

impl AppointmentValidator for ServiceReferenceValidator {
    fn validate(&self, conn: &Connection, appointment: &Appointment, errors: &mut Vec<String>) {
        match find_service(conn, &appointment.service_id) {
            Ok(Some(service)) if service.voided => {
                errors.push(format!("Appointment service '{}' is voided", service.name));
            }
            Ok(Some(_)) => {}
            Ok(None) => errors.push("Appointment service does not exist".into()),
            Err(e) => errors.push(format!("Appointment service could not be verified: {e}")),
        }

        let Some(service_type_id) = appointment.service_type_id else {
            return;
        };
        match find_service_type(conn, &service_type_id) {
            Ok(Some(service_type)) => {
                if service_type.voided {
                    errors.push(format!(
                        "Appointment service type '{}' is voided",
                        service_type.name
                    ));
                }
                if service_type.service_id != appointment.service_id {
                    errors.push(format!(
                        "Service type '{}' does not belong to the appointment service",
                        service_type.name
                    ));
                }
            }
            Ok(None) => errors.push("Appointment service type does not exist".into()),
            Err(e) => errors.push(format!("Appointment service type could not be verified: {e}")),
        }
    }
}
