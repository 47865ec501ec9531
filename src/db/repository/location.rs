use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Location;

pub fn insert_location(conn: &Connection, location: &Location) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO locations (id, name, voided) VALUES (?1, ?2, ?3)",
        params![location.id.to_string(), location.name, location.voided],
    )?;
    Ok(())
}

pub fn find_location(conn: &Connection, id: &Uuid) -> Result<Option<Location>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, voided FROM locations WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(Location {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                name: row.get(1)?,
                voided: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}
