//! Appointment database operations.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, decode, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus, AppointmentView};

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, date, time, status, created_at";

/// Joined view query. Department prefers the doctor's, then the patient's.
const APPOINTMENT_VIEW_SELECT: &str = r#"
    SELECT a.id, a.patient_id, p.name, a.doctor_id, u.name,
           COALESCE(u.department, p.department), a.date, a.time, a.status
    FROM appointments a
    JOIN patients p ON p.id = a.patient_id
    JOIN users u ON u.id = a.doctor_id
"#;

impl Database {
    /// Insert a new appointment, returning its ID.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO appointments (patient_id, doctor_id, date, time, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    appointment.patient_id,
                    appointment.doctor_id,
                    appointment.date,
                    appointment.time,
                    appointment.status.as_str(),
                    appointment.created_at,
                ],
            )
            .map_err(|e| constraint(e, "appointment"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: i64) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [appointment_id],
                appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List appointments with patient and doctor names, optionally for one doctor.
    pub fn list_appointment_views(&self, doctor_id: Option<i64>) -> DbResult<Vec<AppointmentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE ?1 IS NULL OR a.doctor_id = ?1 ORDER BY a.date, a.time, a.id",
            APPOINTMENT_VIEW_SELECT
        ))?;
        let rows = stmt.query_map([doctor_id], appointment_view_row)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?.try_into()?);
        }
        Ok(views)
    }

    /// Most recently booked appointments.
    pub fn recent_appointment_views(&self, limit: usize) -> DbResult<Vec<AppointmentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY a.created_at DESC, a.id DESC LIMIT ?",
            APPOINTMENT_VIEW_SELECT
        ))?;
        let rows = stmt.query_map([limit as i64], appointment_view_row)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?.try_into()?);
        }
        Ok(views)
    }

    /// Mark every appointment for (patient, doctor, date) completed.
    pub fn complete_appointments(&self, patient_id: i64, doctor_id: i64, date: NaiveDate) -> DbResult<usize> {
        Ok(self.conn.execute(
            r#"
            UPDATE appointments SET status = ?4
            WHERE patient_id = ?1 AND doctor_id = ?2 AND date = ?3
            "#,
            params![patient_id, doctor_id, date, AppointmentStatus::Completed.as_str()],
        )?)
    }

    /// Count appointments dated within `[start, end]`, optionally for one doctor.
    pub fn count_appointments_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        doctor_id: Option<i64>,
    ) -> DbResult<i64> {
        Ok(self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE date BETWEEN ?1 AND ?2 AND (?3 IS NULL OR doctor_id = ?3)
            "#,
            params![start, end, doctor_id],
            |row| row.get(0),
        )?)
    }

    /// Count all appointments.
    pub fn count_appointments(&self) -> DbResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?)
    }

    pub(crate) fn delete_appointment_row(&self, appointment_id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [appointment_id])?;
        Ok(rows_affected > 0)
    }

    pub(crate) fn delete_appointments_for_patient(&self, patient_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM appointments WHERE patient_id = ?", [patient_id])?)
    }

    pub(crate) fn delete_appointments_for_doctor(&self, doctor_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM appointments WHERE doctor_id = ?", [doctor_id])?)
    }
}

/// Intermediate row struct for appointment queries.
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: NaiveDate,
    time: NaiveTime,
    status: String,
    created_at: String,
}

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: row.date,
            time: row.time,
            status: decode(&row.status, AppointmentStatus::parse, "appointment status")?,
            created_at: row.created_at,
        })
    }
}

struct AppointmentViewRow {
    id: i64,
    patient_id: i64,
    patient_name: String,
    doctor_id: i64,
    doctor_name: String,
    department: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    status: String,
}

fn appointment_view_row(row: &Row<'_>) -> rusqlite::Result<AppointmentViewRow> {
    Ok(AppointmentViewRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        doctor_id: row.get(3)?,
        doctor_name: row.get(4)?,
        department: row.get(5)?,
        date: row.get(6)?,
        time: row.get(7)?,
        status: row.get(8)?,
    })
}

impl TryFrom<AppointmentViewRow> for AppointmentView {
    type Error = DbError;

    fn try_from(row: AppointmentViewRow) -> Result<Self, Self::Error> {
        Ok(AppointmentView {
            id: row.id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            doctor_id: row.doctor_id,
            doctor_name: row.doctor_name,
            department: row.department,
            date: row.date,
            time: row.time,
            status: decode(&row.status, AppointmentStatus::parse, "appointment status")?,
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

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let (db, patient_id, doctor_id) = setup_db();

        let id = db
            .insert_appointment(&Appointment::new(patient_id, doctor_id, day(16), nine()))
            .unwrap();

        let retrieved = db.get_appointment(id).unwrap().unwrap();
        assert_eq!(retrieved.date, day(16));
        assert_eq!(retrieved.time, nine());
        assert_eq!(retrieved.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_complete_only_matching_date() {
        let (db, patient_id, doctor_id) = setup_db();
        let today = db
            .insert_appointment(&Appointment::new(patient_id, doctor_id, day(15), nine()))
            .unwrap();
        let tomorrow = db
            .insert_appointment(&Appointment::new(patient_id, doctor_id, day(16), nine()))
            .unwrap();

        assert_eq!(db.complete_appointments(patient_id, doctor_id, day(15)).unwrap(), 1);

        let today = db.get_appointment(today).unwrap().unwrap();
        let tomorrow = db.get_appointment(tomorrow).unwrap().unwrap();
        assert_eq!(today.status, AppointmentStatus::Completed);
        assert_eq!(tomorrow.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_views_carry_names() {
        let (db, patient_id, doctor_id) = setup_db();
        db.insert_appointment(&Appointment::new(patient_id, doctor_id, day(16), nine()))
            .unwrap();

        let views = db.list_appointment_views(Some(doctor_id)).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].patient_name, "Jane Doe");
        assert_eq!(views[0].doctor_name, "Dr. Smith");
        assert_eq!(views[0].department.as_deref(), Some("eye"));

        assert!(db.list_appointment_views(Some(doctor_id + 1)).unwrap().is_empty());
        assert_eq!(db.list_appointment_views(None).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_limit_newest_first() {
        let (db, patient_id, doctor_id) = setup_db();
        for d in 1..=7 {
            let mut appointment = Appointment::new(patient_id, doctor_id, day(d), nine());
            appointment.created_at = format!("2024-01-{:02}T08:00:00.000000Z", d);
            db.insert_appointment(&appointment).unwrap();
        }

        let recent = db.recent_appointment_views(5).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].date, day(7));
        assert_eq!(recent[4].date, day(3));
    }

    #[test]
    fn test_count_between_scoped_to_doctor() {
        let (db, patient_id, doctor_id) = setup_db();
        db.insert_appointment(&Appointment::new(patient_id, doctor_id, day(10), nine()))
            .unwrap();
        db.insert_appointment(&Appointment::new(patient_id, doctor_id, day(20), nine()))
            .unwrap();

        assert_eq!(db.count_appointments_between(day(1), day(15), None).unwrap(), 1);
        assert_eq!(db.count_appointments_between(day(1), day(31), Some(doctor_id)).unwrap(), 2);
        assert_eq!(db.count_appointments_between(day(1), day(31), Some(999)).unwrap(), 0);
    }
}
