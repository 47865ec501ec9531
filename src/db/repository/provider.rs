use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Provider;

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO providers (id, person_id, name) VALUES (?1, ?2, ?3)",
        params![
            provider.id.to_string(),
            provider.person_id.map(|u| u.to_string()),
            provider.name,
        ],
    )?;
    Ok(())
}

pub fn find_provider(conn: &Connection, id: &Uuid) -> Result<Option<Provider>, DatabaseError> {
    conn.query_row(
        "SELECT id, person_id, name FROM providers WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(Provider {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                person_id: row
                    .get::<_, Option<String>>(1)?
                    .and_then(|s| Uuid::parse_str(&s).ok()),
                name: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Person identity behind a provider record, if one is linked.
/// Absent for unknown providers and for records without a linked person.
pub fn provider_person_id(
    conn: &Connection,
    provider_id: &Uuid,
) -> Result<Option<Uuid>, DatabaseError> {
    let person: Option<Option<String>> = conn
        .query_row(
            "SELECT person_id FROM providers WHERE id = ?1",
            params![provider_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(person
        .flatten()
        .and_then(|s| Uuid::parse_str(&s).ok()))
}
