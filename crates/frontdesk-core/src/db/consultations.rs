//! Consultation database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, Database, DbResult};
use crate::models::{Consultation, ConsultationRecord};

const CONSULTATION_COLUMNS: &str =
    "id, patient_id, doctor_id, symptoms, diagnosis, prescription, tests, notes, created_at";

impl Database {
    /// Insert a consultation, returning its ID.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO consultations (
                    patient_id, doctor_id, symptoms, diagnosis, prescription,
                    tests, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    consultation.patient_id,
                    consultation.doctor_id,
                    consultation.symptoms,
                    consultation.diagnosis,
                    consultation.prescription,
                    consultation.tests,
                    consultation.notes,
                    consultation.created_at,
                ],
            )
            .map_err(|e| constraint(e, "consultation"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, consultation_id: i64) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM consultations WHERE id = ?",
                    CONSULTATION_COLUMNS
                ),
                [consultation_id],
                consultation_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Update the clinical fields of a consultation.
    pub fn update_consultation(&self, consultation: &Consultation) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE consultations SET
                    symptoms = ?2,
                    diagnosis = ?3,
                    prescription = ?4,
                    tests = ?5,
                    notes = ?6
                WHERE id = ?1
                "#,
                params![
                    consultation.id,
                    consultation.symptoms,
                    consultation.diagnosis,
                    consultation.prescription,
                    consultation.tests,
                    consultation.notes,
                ],
            )
            .map_err(|e| constraint(e, "consultation"))?;
        Ok(rows_affected > 0)
    }

    /// A patient's consultations, newest first, with billed amount and doctor name.
    pub fn consultation_history(&self, patient_id: i64) -> DbResult<Vec<ConsultationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.patient_id, c.symptoms, c.diagnosis, c.prescription, c.tests,
                   c.notes, COALESCE(b.amount, 0), c.doctor_id, COALESCE(u.name, 'Unknown'),
                   c.created_at
            FROM consultations c
            LEFT JOIN billing b ON b.consultation_id = c.id
            LEFT JOIN users u ON u.id = c.doctor_id
            WHERE c.patient_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(ConsultationRecord {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                symptoms: row.get(2)?,
                diagnosis: row.get(3)?,
                prescription: row.get(4)?,
                tests: row.get(5)?,
                notes: row.get(6)?,
                amount: row.get(7)?,
                doctor_id: row.get(8)?,
                doctor_name: row.get(9)?,
                created_at: row.get(10)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count consultations for a patient and doctor pair.
    pub fn count_consultations_for_visit(&self, patient_id: i64, doctor_id: i64) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM consultations WHERE patient_id = ?1 AND doctor_id = ?2",
            params![patient_id, doctor_id],
            |row| row.get(0),
        )?)
    }

    /// Count consultations created within `[start, end]`, optionally for one doctor.
    pub fn count_consultations_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        doctor_id: Option<i64>,
    ) -> DbResult<i64> {
        Ok(self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM consultations
            WHERE date(created_at) BETWEEN ?1 AND ?2 AND (?3 IS NULL OR doctor_id = ?3)
            "#,
            params![start, end, doctor_id],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn consultation_ids_for_patient(&self, patient_id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM consultations WHERE patient_id = ? ORDER BY id")?;
        let rows = stmt.query_map([patient_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub(crate) fn consultation_ids_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM consultations WHERE doctor_id = ? ORDER BY id")?;
        let rows = stmt.query_map([doctor_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub(crate) fn delete_consultation_row(&self, consultation_id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM consultations WHERE id = ?", [consultation_id])
            .map_err(|e| constraint(e, "consultation still billed"))?;
        Ok(rows_affected > 0)
    }
}

fn consultation_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        symptoms: row.get(3)?,
        diagnosis: row.get(4)?,
        prescription: row.get(5)?,
        tests: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}
