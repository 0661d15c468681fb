//! Read-only roster lookup.
//!
//! The roster is written by external import tooling; the gate only reads
//! it at startup to build the id -> display-info table.

use facegate_core::{Student, StudentId};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster query failed (is the students table present?): {0}")]
    Query(#[from] rusqlite::Error),
    #[error("roster is empty")]
    Empty,
}

/// Fetch every enrolled student. An empty or missing table is fatal at
/// startup: a gate with nobody enrolled cannot mark anyone.
pub fn load_roster(conn: &Connection) -> Result<Vec<Student>, RosterError> {
    let mut stmt =
        conn.prepare("SELECT id, name, usn, parent_number, dataset_folder FROM students")?;
    let students = stmt
        .query_map([], |row| {
            Ok(Student {
                id: StudentId(row.get(0)?),
                name: row.get(1)?,
                usn: row.get(2)?,
                guardian_contact: row.get(3)?,
                dataset_folder: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if students.is_empty() {
        return Err(RosterError::Empty);
    }
    tracing::info!(students = students.len(), "loaded roster");
    Ok(students)
}

/// Fetch one student by id, if enrolled.
pub fn fetch_by_id(conn: &Connection, id: StudentId) -> Result<Option<Student>, RosterError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, usn, parent_number, dataset_folder FROM students WHERE id = ?1",
    )?;
    let student = stmt
        .query_row([id.0], |row| {
            Ok(Student {
                id: StudentId(row.get(0)?),
                name: row.get(1)?,
                usn: row.get(2)?,
                guardian_contact: row.get(3)?,
                dataset_folder: row.get(4)?,
            })
        })
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(student)
}
