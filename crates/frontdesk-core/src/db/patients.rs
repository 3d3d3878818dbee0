//! Patient database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, Database, DbResult};
use crate::models::{Patient, PatientSummary};

const PATIENT_COLUMNS: &str = "id, name, age, gender, phone, address, department, created_at";

impl Database {
    /// Insert a new patient, returning its ID.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO patients (
                    name, age, gender, phone, address, department, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    patient.name,
                    patient.age,
                    patient.gender,
                    patient.phone,
                    patient.address,
                    patient.department,
                    patient.created_at,
                ],
            )
            .map_err(|e| constraint(e, "patient"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing patient's demographics.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                age = ?3,
                gender = ?4,
                phone = ?5,
                address = ?6,
                department = ?7
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.age,
                patient.gender,
                patient.phone,
                patient.address,
                patient.department,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [patient_id],
                patient_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a patient by exact name (first registered wins on duplicates).
    pub fn find_patient_by_name(&self, name: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM patients WHERE name = ? ORDER BY id LIMIT 1",
                    PATIENT_COLUMNS
                ),
                [name],
                patient_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients in registration order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM patients ORDER BY id", PATIENT_COLUMNS))?;
        let rows = stmt.query_map([], patient_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients with the timestamp of their latest consultation.
    pub fn list_patient_summaries(&self) -> DbResult<Vec<PatientSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.name, p.age, p.gender, p.phone, p.address, p.department, p.created_at,
                   (SELECT MAX(c.created_at) FROM consultations c WHERE c.patient_id = p.id)
            FROM patients p
            ORDER BY p.id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PatientSummary {
                patient: patient_row(row)?,
                last_session: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Patients with any consultation, appointment or queue entry for a doctor,
    /// with the doctor's latest consultation time for each.
    pub fn list_patients_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<PatientSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.name, p.age, p.gender, p.phone, p.address, p.department, p.created_at,
                   (SELECT MAX(c.created_at) FROM consultations c
                     WHERE c.patient_id = p.id AND c.doctor_id = ?1)
            FROM patients p
            WHERE p.id IN (
                SELECT patient_id FROM consultations WHERE doctor_id = ?1
                UNION
                SELECT patient_id FROM appointments WHERE doctor_id = ?1
                UNION
                SELECT patient_id FROM queue WHERE doctor_id = ?1
            )
            ORDER BY p.id
            "#,
        )?;
        let rows = stmt.query_map([doctor_id], |row| {
            Ok(PatientSummary {
                patient: patient_row(row)?,
                last_session: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All patient names, for form autocompletion.
    pub fn list_patient_names(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM patients ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Latest consultation time for a patient.
    pub fn last_consultation_at(&self, patient_id: i64) -> DbResult<Option<String>> {
        Ok(self.conn.query_row(
            "SELECT MAX(created_at) FROM consultations WHERE patient_id = ?",
            [patient_id],
            |row| row.get(0),
        )?)
    }

    /// Count all patients.
    pub fn count_patients(&self) -> DbResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?)
    }

    /// Count patients registered under a department.
    pub fn count_patients_in_department(&self, department: &str) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE department = ?",
            [department],
            |row| row.get(0),
        )?)
    }

    /// Count patients registered between two dates (inclusive).
    pub fn count_patients_registered(&self, start: NaiveDate, end: NaiveDate) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE date(created_at) BETWEEN ?1 AND ?2",
            params![start, end],
            |row| row.get(0),
        )?)
    }

    /// Patient counts grouped by department.
    pub fn count_patients_by_department(&self) -> DbResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT department, COUNT(id)
            FROM patients
            GROUP BY department
            ORDER BY department
            "#,
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete the patient row only. Dependents must already be gone.
    pub(crate) fn delete_patient_row(&self, patient_id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [patient_id])
            .map_err(|e| constraint(e, "patient still referenced"))?;
        Ok(rows_affected > 0)
    }
}

fn patient_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        department: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn jane() -> Patient {
        Patient::new("Jane Doe".into(), 30, "female".into(), "0700000000".into(), "eye".into())
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = jane();
        patient.address = Some("12 Hospital Rd".into());
        let id = db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Jane Doe");
        assert_eq!(retrieved.age, 30);
        assert_eq!(retrieved.address.as_deref(), Some("12 Hospital Rd"));
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = jane();
        patient.id = db.insert_patient(&patient).unwrap();

        patient.age = 31;
        patient.department = "ent".into();
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved.age, 31);
        assert_eq!(retrieved.department, "ent");
    }

    #[test]
    fn test_update_missing_patient() {
        let db = setup_db();
        let mut patient = jane();
        patient.id = 42;
        assert!(!db.update_patient(&patient).unwrap());
    }

    #[test]
    fn test_department_breakdown() {
        let db = setup_db();
        db.insert_patient(&jane()).unwrap();
        db.insert_patient(&Patient::new("John".into(), 40, "male".into(), "1".into(), "eye".into()))
            .unwrap();
        db.insert_patient(&Patient::new("Ann".into(), 22, "female".into(), "2".into(), "skin".into()))
            .unwrap();

        let breakdown = db.count_patients_by_department().unwrap();
        assert_eq!(breakdown, vec![("eye".to_string(), 2), ("skin".to_string(), 1)]);
        assert_eq!(db.count_patients_in_department("eye").unwrap(), 2);
    }

    #[test]
    fn test_count_registered_by_date() {
        let db = setup_db();
        let mut old = jane();
        old.created_at = "2024-01-10T08:00:00.000000Z".into();
        db.insert_patient(&old).unwrap();
        let mut newer = jane();
        newer.created_at = "2024-01-15T23:59:59.999999Z".into();
        db.insert_patient(&newer).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(db.count_patients_registered(start, end).unwrap(), 1);
    }
}
