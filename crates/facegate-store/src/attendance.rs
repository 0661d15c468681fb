//! Durable attendance log on SQLite.
//!
//! Once-per-day marking is enforced by a UNIQUE index on
//! (student_id, date) plus INSERT OR IGNORE, so the check and the insert
//! are one atomic statement even when multiple camera stations share the
//! database file.

use chrono::{NaiveDate, NaiveTime};
use facegate_core::{AttendanceLog, AttendanceStatus, StudentId};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum AttendanceDbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Handle to the attendance database. Owned by the recognition loop
/// thread; concurrent stations coordinate through SQLite itself.
pub struct AttendanceDb {
    conn: Connection,
}

impl AttendanceDb {
    /// Open (creating if needed) and migrate the attendance schema.
    pub fn open(path: &Path) -> Result<Self, AttendanceDbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(error) = std::fs::create_dir_all(parent) {
                    tracing::warn!(%error, dir = %parent.display(), "could not create db directory");
                }
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, AttendanceDbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AttendanceDbError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS attendance (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 student_id INTEGER NOT NULL,
                 date TEXT NOT NULL,
                 time TEXT NOT NULL,
                 status TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_student_date
                 ON attendance (student_id, date);",
        )?;
        Ok(Self { conn })
    }

    /// Shared connection, for the read-only roster queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Whether a record exists for (student, date).
    pub fn exists(&self, student: StudentId, date: NaiveDate) -> Result<bool, AttendanceDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM attendance WHERE student_id = ?1 AND date = ?2")?;
        Ok(stmt.exists(rusqlite::params![student.0, date.to_string()])?)
    }

    /// Atomic insert-if-absent on the (student, date) key. Returns true
    /// only when this call created the record.
    pub fn insert(
        &self,
        student: StudentId,
        date: NaiveDate,
        time: NaiveTime,
        status: AttendanceStatus,
    ) -> Result<bool, AttendanceDbError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO attendance (student_id, date, time, status)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                student.0,
                date.to_string(),
                time.format("%H:%M:%S").to_string(),
                status.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }
}

impl AttendanceLog for AttendanceDb {
    fn insert_if_absent(
        &mut self,
        student: StudentId,
        date: NaiveDate,
        time: NaiveTime,
        status: AttendanceStatus,
    ) -> anyhow::Result<bool> {
        Ok(self.insert(student, date, time, status)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_insert_then_duplicate_is_ignored() {
        let db = AttendanceDb::open_in_memory().unwrap();
        assert!(db.insert(StudentId(1), day(10), at(8, 40), AttendanceStatus::Present).unwrap());
        assert!(!db.insert(StudentId(1), day(10), at(9, 0), AttendanceStatus::Late).unwrap());

        // Original record survives
        let status: String = db
            .conn()
            .query_row(
                "SELECT status FROM attendance WHERE student_id = 1 AND date = '2025-03-10'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(status, "present");
    }

    #[test]
    fn test_distinct_days_and_students_insert() {
        let db = AttendanceDb::open_in_memory().unwrap();
        assert!(db.insert(StudentId(1), day(10), at(8, 40), AttendanceStatus::Present).unwrap());
        assert!(db.insert(StudentId(2), day(10), at(13, 0), AttendanceStatus::HalfDay).unwrap());
        assert!(db.insert(StudentId(1), day(11), at(9, 0), AttendanceStatus::Late).unwrap());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_exists() {
        let db = AttendanceDb::open_in_memory().unwrap();
        assert!(!db.exists(StudentId(1), day(10)).unwrap());
        db.insert(StudentId(1), day(10), at(8, 0), AttendanceStatus::Present).unwrap();
        assert!(db.exists(StudentId(1), day(10)).unwrap());
        assert!(!db.exists(StudentId(1), day(11)).unwrap());
    }

    #[test]
    fn test_open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facegate.db");
        {
            let db = AttendanceDb::open(&path).unwrap();
            db.insert(StudentId(5), day(10), at(8, 0), AttendanceStatus::Present).unwrap();
        }
        // Reopen: data persisted, schema migration is idempotent
        let db = AttendanceDb::open(&path).unwrap();
        assert!(db.exists(StudentId(5), day(10)).unwrap());
    }
}
