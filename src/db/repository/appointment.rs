use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    instant_from_string, instant_to_string, Appointment, AppointmentKind, AppointmentSearch,
    AppointmentStatus,
};

const COLUMNS: &str = "id, external_id, patient_id, provider_id, service_id, service_type_id, \
                       location_id, start_time, end_time, kind, status, comments";

fn row_to_appointment(row: &Row) -> rusqlite::Result<Appointment> {
    let start: String = row.get(7)?;
    let end: String = row.get(8)?;
    let kind: String = row.get(9)?;
    let status: String = row.get(10)?;
    Ok(Appointment {
        id: Some(row.get(0)?),
        external_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        provider_id: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| Uuid::parse_str(&s).ok()),
        service_id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        service_type_id: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| Uuid::parse_str(&s).ok()),
        location_id: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| Uuid::parse_str(&s).ok()),
        start_time: instant_from_string(&start)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
        end_time: instant_from_string(&end)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        kind: AppointmentKind::from_str(&kind)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?,
        status: AppointmentStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?,
        comments: row.get(11)?,
    })
}

/// Insert-or-update by external id. Fills in the surrogate id on insert.
pub fn save_appointment(
    conn: &Connection,
    appointment: &mut Appointment,
) -> Result<(), DatabaseError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM appointments WHERE external_id = ?1",
            params![appointment.external_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE appointments
                 SET patient_id = ?1, provider_id = ?2, service_id = ?3, service_type_id = ?4,
                     location_id = ?5, start_time = ?6, end_time = ?7, kind = ?8, status = ?9,
                     comments = ?10
                 WHERE id = ?11",
                params![
                    appointment.patient_id.to_string(),
                    appointment.provider_id.map(|u| u.to_string()),
                    appointment.service_id.to_string(),
                    appointment.service_type_id.map(|u| u.to_string()),
                    appointment.location_id.map(|u| u.to_string()),
                    instant_to_string(&appointment.start_time),
                    instant_to_string(&appointment.end_time),
                    appointment.kind.as_str(),
                    appointment.status.as_str(),
                    appointment.comments,
                    id,
                ],
            )?;
            appointment.id = Some(id);
        }
        None => {
            conn.execute(
                "INSERT INTO appointments (external_id, patient_id, provider_id, service_id,
                     service_type_id, location_id, start_time, end_time, kind, status, comments)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    appointment.external_id.to_string(),
                    appointment.patient_id.to_string(),
                    appointment.provider_id.map(|u| u.to_string()),
                    appointment.service_id.to_string(),
                    appointment.service_type_id.map(|u| u.to_string()),
                    appointment.location_id.map(|u| u.to_string()),
                    instant_to_string(&appointment.start_time),
                    instant_to_string(&appointment.end_time),
                    appointment.kind.as_str(),
                    appointment.status.as_str(),
                    appointment.comments,
                ],
            )?;
            appointment.id = Some(conn.last_insert_rowid());
        }
    }
    Ok(())
}

pub fn find_appointment_by_external_id(
    conn: &Connection,
    external_id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM appointments WHERE external_id = ?1"),
        params![external_id.to_string()],
        row_to_appointment,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// All appointments, or only those starting on the given calendar day.
pub fn list_appointments(
    conn: &Connection,
    for_date: Option<NaiveDate>,
) -> Result<Vec<Appointment>, DatabaseError> {
    match for_date {
        Some(date) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM appointments
                 WHERE substr(start_time, 1, 10) = ?1
                 ORDER BY start_time, id"
            ))?;
            let rows = stmt.query_map(params![date.to_string()], row_to_appointment)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM appointments ORDER BY start_time, id"
            ))?;
            let rows = stmt.query_map([], row_to_appointment)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
        }
    }
}

pub fn appointments_in_range(
    conn: &Connection,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM appointments
         WHERE start_time >= ?1 AND start_time <= ?2
         ORDER BY start_time, id"
    ))?;
    let rows = stmt.query_map(
        params![instant_to_string(start), instant_to_string(end)],
        row_to_appointment,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Appointments for one service, optionally bounded by date and status set.
pub fn appointments_for_service(
    conn: &Connection,
    service_id: &Uuid,
    start: Option<&DateTime<Utc>>,
    end: Option<&DateTime<Utc>>,
    statuses: Option<&[AppointmentStatus]>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!("SELECT {COLUMNS} FROM appointments WHERE service_id = ?1");
    let mut args: Vec<String> = vec![service_id.to_string()];

    if let Some(start) = start {
        args.push(instant_to_string(start));
        sql.push_str(&format!(" AND start_time >= ?{}", args.len()));
    }
    if let Some(end) = end {
        args.push(instant_to_string(end));
        sql.push_str(&format!(" AND start_time <= ?{}", args.len()));
    }
    if let Some(statuses) = statuses {
        if !statuses.is_empty() {
            let placeholders: Vec<String> = statuses
                .iter()
                .map(|s| {
                    args.push(s.as_str().to_string());
                    format!("?{}", args.len())
                })
                .collect();
            sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
        }
    }
    sql.push_str(" ORDER BY start_time, id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn future_appointments_for_service(
    conn: &Connection,
    service_id: &Uuid,
    after: &DateTime<Utc>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM appointments
         WHERE service_id = ?1 AND start_time > ?2
         ORDER BY start_time, id"
    ))?;
    let rows = stmt.query_map(
        params![service_id.to_string(), instant_to_string(after)],
        row_to_appointment,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn future_appointments_for_service_type(
    conn: &Connection,
    service_type_id: &Uuid,
    after: &DateTime<Utc>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM appointments
         WHERE service_type_id = ?1 AND start_time > ?2
         ORDER BY start_time, id"
    ))?;
    let rows = stmt.query_map(
        params![service_type_id.to_string(), instant_to_string(after)],
        row_to_appointment,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Dynamic search over the descriptor's populated filters.
/// Date-bound presence is the caller's contract (`lifecycle::search`).
pub fn search_appointments(
    conn: &Connection,
    search: &AppointmentSearch,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!("SELECT {COLUMNS} FROM appointments WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(start) = &search.start_date {
        args.push(instant_to_string(start));
        sql.push_str(&format!(" AND start_time >= ?{}", args.len()));
    }
    if let Some(end) = &search.end_date {
        args.push(instant_to_string(end));
        sql.push_str(&format!(" AND start_time <= ?{}", args.len()));
    }
    if let Some(patient_id) = &search.patient_id {
        args.push(patient_id.to_string());
        sql.push_str(&format!(" AND patient_id = ?{}", args.len()));
    }
    if let Some(provider_id) = &search.provider_id {
        args.push(provider_id.to_string());
        sql.push_str(&format!(" AND provider_id = ?{}", args.len()));
    }
    if let Some(service_id) = &search.service_id {
        args.push(service_id.to_string());
        sql.push_str(&format!(" AND service_id = ?{}", args.len()));
    }
    if let Some(location_id) = &search.location_id {
        args.push(location_id.to_string());
        sql.push_str(&format!(" AND location_id = ?{}", args.len()));
    }
    if let Some(status) = &search.status {
        args.push(status.as_str().to_string());
        sql.push_str(&format!(" AND status = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY start_time, id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
