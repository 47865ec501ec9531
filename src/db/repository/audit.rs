use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

use crate::db::DatabaseError;
use crate::models::{
    instant_from_string, instant_to_string, Appointment, AppointmentAudit, AppointmentStatus,
};

fn row_to_audit(row: &Row) -> rusqlite::Result<AppointmentAudit> {
    let status: String = row.get(2)?;
    let created_at: String = row.get(4)?;
    Ok(AppointmentAudit {
        id: Some(row.get(0)?),
        appointment_id: row.get(1)?,
        status: AppointmentStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        notes: row.get(3)?,
        created_at: instant_from_string(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
    })
}

/// Append one audit record capturing the appointment's current status.
/// The trail is append-only; no update or delete operation exists.
pub fn record_audit_event(
    conn: &Connection,
    appointment: &Appointment,
    notes: Option<&str>,
) -> Result<AppointmentAudit, DatabaseError> {
    let appointment_id = appointment.id.ok_or_else(|| {
        DatabaseError::ConstraintViolation("audit record for unsaved appointment".into())
    })?;
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO appointment_audits (appointment_id, status, notes, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            appointment_id,
            appointment.status.as_str(),
            notes,
            instant_to_string(&created_at),
        ],
    )?;
    Ok(AppointmentAudit {
        id: Some(conn.last_insert_rowid()),
        appointment_id,
        status: appointment.status.clone(),
        notes: notes.map(Into::into),
        created_at,
    })
}

/// The record immediately preceding the current status: newest entry whose
/// recorded status differs from the appointment's current one.
pub fn prior_status_change_event(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<Option<AppointmentAudit>, DatabaseError> {
    let Some(appointment_id) = appointment.id else {
        return Ok(None);
    };
    conn.query_row(
        "SELECT id, appointment_id, status, notes, created_at
         FROM appointment_audits
         WHERE appointment_id = ?1 AND status != ?2
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
        params![appointment_id, appointment.status.as_str()],
        row_to_audit,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Full ordered trail for one appointment, oldest first.
pub fn audit_history(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<Vec<AppointmentAudit>, DatabaseError> {
    let Some(appointment_id) = appointment.id else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(
        "SELECT id, appointment_id, status, notes, created_at
         FROM appointment_audits
         WHERE appointment_id = ?1
         ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![appointment_id], row_to_audit)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
