use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Appointment, ClinicService, ServiceType};

pub fn insert_service(conn: &Connection, service: &ClinicService) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinic_services (id, name, voided) VALUES (?1, ?2, ?3)",
        params![service.id.to_string(), service.name, service.voided],
    )?;
    Ok(())
}

pub fn insert_service_type(
    conn: &Connection,
    service_type: &ServiceType,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO service_types (id, service_id, name, duration_mins, voided)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service_type.id.to_string(),
            service_type.service_id.to_string(),
            service_type.name,
            service_type.duration_mins,
            service_type.voided,
        ],
    )?;
    Ok(())
}

pub fn find_service(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ClinicService>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, voided FROM clinic_services WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(ClinicService {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                name: row.get(1)?,
                voided: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn find_service_type(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ServiceType>, DatabaseError> {
    conn.query_row(
        "SELECT id, service_id, name, duration_mins, voided FROM service_types WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(ServiceType {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                service_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
                name: row.get(2)?,
                duration_mins: row.get(3)?,
                voided: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Soft-delete. The row stays stored; listings stop showing appointments
/// that reference it.
pub fn void_service(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE clinic_services SET voided = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ClinicService".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn void_service_type(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE service_types SET voided = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ServiceType".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Voided service / service-type ids, for the uniform listing filter.
#[derive(Debug, Default)]
pub struct VoidedRefs {
    services: HashSet<Uuid>,
    service_types: HashSet<Uuid>,
}

impl VoidedRefs {
    /// True when the appointment references a voided service or service type.
    pub fn excludes(&self, appointment: &Appointment) -> bool {
        self.services.contains(&appointment.service_id)
            || appointment
                .service_type_id
                .map_or(false, |st| self.service_types.contains(&st))
    }
}

pub fn voided_references(conn: &Connection) -> Result<VoidedRefs, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM clinic_services WHERE voided = 1")?;
    let services = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|s| Uuid::parse_str(&s).ok())
        .collect();

    let mut stmt = conn.prepare("SELECT id FROM service_types WHERE voided = 1")?;
    let service_types = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|s| Uuid::parse_str(&s).ok())
        .collect();

    Ok(VoidedRefs { services, service_types })
}
