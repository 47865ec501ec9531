use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name) VALUES (?1, ?2)",
        params![patient.id.to_string(), patient.name],
    )?;
    Ok(())
}

pub fn find_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        "SELECT id, name FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(Patient {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_then_find() {
        let conn = open_memory_database().unwrap();
        let patient = Patient { id: Uuid::new_v4(), name: "Ada Ngalo".into() };
        insert_patient(&conn, &patient).unwrap();

        let found = find_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(found.name, "Ada Ngalo");
        assert!(find_patient(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
