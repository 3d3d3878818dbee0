//! Doctor visit queue database operations.
//!
//! Reads are strictly FIFO: `ORDER BY created_at, id`. Priority is stored
//! and returned but never consulted for ordering.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, decode, Database, DbError, DbResult};
use crate::models::{QueueEntry, QueueStatus, QueueView};

const QUEUE_COLUMNS: &str = "id, patient_id, doctor_id, status, priority, created_at";

const QUEUE_VIEW_SELECT: &str = r#"
    SELECT q.id, q.patient_id, p.name, q.doctor_id, u.name,
           COALESCE(u.department, p.department), q.status, q.priority, q.created_at
    FROM queue q
    JOIN patients p ON p.id = q.patient_id
    JOIN users u ON u.id = q.doctor_id
"#;

impl Database {
    /// Insert a queue entry, returning its ID.
    pub fn insert_queue_entry(&self, entry: &QueueEntry) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO queue (patient_id, doctor_id, status, priority, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    entry.patient_id,
                    entry.doctor_id,
                    entry.status.as_str(),
                    entry.priority,
                    entry.created_at,
                ],
            )
            .map_err(|e| constraint(e, "queue entry"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a queue entry by ID.
    pub fn get_queue_entry(&self, queue_id: i64) -> DbResult<Option<QueueEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM queue WHERE id = ?", QUEUE_COLUMNS),
                [queue_id],
                queue_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Set the status of a queue entry.
    pub fn set_queue_status(&self, queue_id: i64, status: QueueStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE queue SET status = ?2 WHERE id = ?1",
            params![queue_id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// A doctor's queue in arrival order.
    pub fn list_queue_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<QueueView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE q.doctor_id = ? ORDER BY q.created_at, q.id",
            QUEUE_VIEW_SELECT
        ))?;
        let rows = stmt.query_map([doctor_id], queue_view_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Every doctor's queue in arrival order.
    pub fn list_queue(&self) -> DbResult<Vec<QueueView>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY q.created_at, q.id", QUEUE_VIEW_SELECT))?;
        let rows = stmt.query_map([], queue_view_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Count queue entries, optionally filtered by status and doctor.
    pub fn count_queue(&self, status: Option<QueueStatus>, doctor_id: Option<i64>) -> DbResult<i64> {
        Ok(self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM queue
            WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR doctor_id = ?2)
            "#,
            params![status.map(QueueStatus::as_str), doctor_id],
            |row| row.get(0),
        )?)
    }

    /// Remove every queue entry for a (patient, doctor) pair.
    pub fn delete_queue_for_visit(&self, patient_id: i64, doctor_id: i64) -> DbResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM queue WHERE patient_id = ?1 AND doctor_id = ?2",
            params![patient_id, doctor_id],
        )?)
    }

    pub(crate) fn delete_queue_entry_row(&self, queue_id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM queue WHERE id = ?", [queue_id])?;
        Ok(rows_affected > 0)
    }

    pub(crate) fn delete_queue_for_patient(&self, patient_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM queue WHERE patient_id = ?", [patient_id])?)
    }

    pub(crate) fn delete_queue_for_doctor(&self, doctor_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM queue WHERE doctor_id = ?", [doctor_id])?)
    }
}

struct QueueRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    status: String,
    priority: i64,
    created_at: String,
}

fn queue_row(row: &Row<'_>) -> rusqlite::Result<QueueRow> {
    Ok(QueueRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl TryFrom<QueueRow> for QueueEntry {
    type Error = DbError;

    fn try_from(row: QueueRow) -> Result<Self, Self::Error> {
        Ok(QueueEntry {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            status: decode(&row.status, QueueStatus::parse, "queue status")?,
            priority: row.priority,
            created_at: row.created_at,
        })
    }
}

struct QueueViewRow {
    id: i64,
    patient_id: i64,
    patient_name: String,
    doctor_id: i64,
    doctor_name: String,
    department: Option<String>,
    status: String,
    priority: i64,
    created_at: String,
}

fn queue_view_row(row: &Row<'_>) -> rusqlite::Result<QueueViewRow> {
    Ok(QueueViewRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        doctor_id: row.get(3)?,
        doctor_name: row.get(4)?,
        department: row.get(5)?,
        status: row.get(6)?,
        priority: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl TryFrom<QueueViewRow> for QueueView {
    type Error = DbError;

    fn try_from(row: QueueViewRow) -> Result<Self, Self::Error> {
        Ok(QueueView {
            id: row.id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            doctor_id: row.doctor_id,
            doctor_name: row.doctor_name,
            department: row.department,
            status: decode(&row.status, QueueStatus::parse, "queue status")?,
            priority: row.priority,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, Patient, Role, User};

    fn setup_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let patient_id = db
            .insert_patient(&Patient::new("Jane Doe".into(), 30, "female".into(), "0700".into(), "eye".into()))
            .unwrap();
        let doctor_id = db
            .insert_user(&User::new(
                "Dr. Smith".into(),
                "smith@hospital.com".into(),
                "x".into(),
                Role::Doctor,
                Some(Department::Eye),
            ))
            .unwrap();
        (db, patient_id, doctor_id)
    }

    #[test]
    fn test_fifo_ignores_priority() {
        let (db, patient_id, doctor_id) = setup_db();

        let mut appointment = QueueEntry::from_appointment(patient_id, doctor_id);
        appointment.created_at = "2024-01-15T10:00:00.000000Z".into();
        let first = db.insert_queue_entry(&appointment).unwrap();

        let mut walk_in = QueueEntry::walk_in(patient_id, doctor_id);
        walk_in.created_at = "2024-01-15T10:05:00.000000Z".into();
        let second = db.insert_queue_entry(&walk_in).unwrap();

        let queue = db.list_queue_for_doctor(doctor_id).unwrap();
        let ids: Vec<i64> = queue.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(queue[0].priority, 1);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let (db, patient_id, doctor_id) = setup_db();
        let mut entry = QueueEntry::walk_in(patient_id, doctor_id);
        entry.created_at = "2024-01-15T10:00:00.000000Z".into();
        let a = db.insert_queue_entry(&entry).unwrap();
        let b = db.insert_queue_entry(&entry).unwrap();

        let ids: Vec<i64> = db.list_queue().unwrap().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_status_and_counts() {
        let (db, patient_id, doctor_id) = setup_db();
        let id = db.insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor_id)).unwrap();
        db.insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor_id)).unwrap();

        assert!(db.set_queue_status(id, QueueStatus::InProgress).unwrap());
        assert_eq!(
            db.get_queue_entry(id).unwrap().unwrap().status,
            QueueStatus::InProgress
        );
        assert_eq!(db.count_queue(Some(QueueStatus::Waiting), None).unwrap(), 1);
        assert_eq!(db.count_queue(None, Some(doctor_id)).unwrap(), 2);

        assert_eq!(db.delete_queue_for_visit(patient_id, doctor_id).unwrap(), 2);
        assert_eq!(db.count_queue(None, None).unwrap(), 0);
    }

    #[test]
    fn test_unknown_doctor_rejected() {
        let (db, patient_id, _) = setup_db();
        let result = db.insert_queue_entry(&QueueEntry::walk_in(patient_id, 999));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }
}
