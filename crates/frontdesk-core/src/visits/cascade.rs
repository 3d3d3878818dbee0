//! Cascade deletes, one routine per root entity.
//!
//! Each routine runs in a single transaction. Foreign keys carry no
//! `ON DELETE` action, so a dependent missed here aborts the whole delete.

use serde::Serialize;

use super::VisitEngine;
use crate::db::Database;
use crate::models::Role;
use crate::FrontDeskError;

/// Rows removed by a cascade delete.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CascadeSummary {
    pub vitals: usize,
    pub appointments: usize,
    pub queue_entries: usize,
    pub consultations: usize,
    pub bills: usize,
}

impl VisitEngine<'_> {
    /// Delete a patient with all vitals, appointments, queue entries,
    /// consultations and bills.
    pub fn delete_patient(&self, patient_id: i64) -> Result<CascadeSummary, FrontDeskError> {
        if self.db.get_patient(patient_id)?.is_none() {
            return Err(FrontDeskError::NotFound(format!("Patient {}", patient_id)));
        }

        let summary = self.db.atomically(|db| {
            let mut summary = CascadeSummary {
                vitals: db.delete_vitals_for_patient(patient_id)?,
                appointments: db.delete_appointments_for_patient(patient_id)?,
                queue_entries: db.delete_queue_for_patient(patient_id)?,
                ..Default::default()
            };
            for consultation_id in db.consultation_ids_for_patient(patient_id)? {
                remove_consultation(db, consultation_id, &mut summary)?;
            }
            db.delete_patient_row(patient_id)?;
            Ok::<_, FrontDeskError>(summary)
        })?;

        tracing::info!(patient_id, ?summary, "patient deleted");
        Ok(summary)
    }

    /// Delete a doctor or receptionist with everything that references them.
    ///
    /// Administrators cannot be deleted.
    pub fn delete_staff(&self, user_id: i64) -> Result<CascadeSummary, FrontDeskError> {
        let user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("User {}", user_id)))?;
        if user.role == Role::Admin {
            return Err(FrontDeskError::Validation("Cannot delete admin user".into()));
        }

        let summary = self.db.atomically(|db| {
            let mut summary = CascadeSummary {
                appointments: db.delete_appointments_for_doctor(user_id)?,
                ..Default::default()
            };
            for consultation_id in db.consultation_ids_for_doctor(user_id)? {
                remove_consultation(db, consultation_id, &mut summary)?;
            }
            summary.vitals = db.delete_vitals_recorded_by(user_id)?;
            summary.queue_entries = db.delete_queue_for_doctor(user_id)?;
            db.delete_user_row(user_id)?;
            Ok::<_, FrontDeskError>(summary)
        })?;

        tracing::info!(user_id, role = user.role.as_str(), ?summary, "staff deleted");
        Ok(summary)
    }

    /// Delete a consultation and its bill.
    pub fn delete_consultation(&self, consultation_id: i64) -> Result<CascadeSummary, FrontDeskError> {
        if self.db.get_consultation(consultation_id)?.is_none() {
            return Err(FrontDeskError::NotFound(format!(
                "Consultation {}",
                consultation_id
            )));
        }

        let summary = self.db.atomically(|db| {
            let mut summary = CascadeSummary::default();
            remove_consultation(db, consultation_id, &mut summary)?;
            Ok::<_, FrontDeskError>(summary)
        })?;

        tracing::info!(consultation_id, bills = summary.bills, "consultation deleted");
        Ok(summary)
    }
}

fn remove_consultation(
    db: &Database,
    consultation_id: i64,
    summary: &mut CascadeSummary,
) -> Result<(), FrontDeskError> {
    summary.bills += db.delete_billing_for_consultation(consultation_id)?;
    if db.delete_consultation_row(consultation_id)? {
        summary.consultations += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Appointment, Billing, Charge, Consultation, ConsultationNote, Department, Patient,
        QueueEntry, User, VitalSigns, VitalsReading,
    };
    use chrono::{NaiveDate, NaiveTime};

    struct Fixture {
        db: Database,
        patient_id: i64,
        doctor_id: i64,
        receptionist_id: i64,
        consultation_id: i64,
    }

    fn setup() -> Fixture {
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
        let receptionist_id = db
            .insert_user(&User::new(
                "Rita".into(),
                "rita@hospital.com".into(),
                "x".into(),
                Role::Receptionist,
                Some(Department::Reception),
            ))
            .unwrap();

        db.insert_vitals(&VitalSigns::new(patient_id, receptionist_id, VitalsReading::default()))
            .unwrap();
        db.insert_appointment(&Appointment::new(
            patient_id,
            doctor_id,
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        ))
        .unwrap();
        db.insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor_id))
            .unwrap();
        let consultation_id = db
            .insert_consultation(&Consultation::new(
                patient_id,
                doctor_id,
                ConsultationNote {
                    diagnosis: "Conjunctivitis".into(),
                    ..Default::default()
                },
            ))
            .unwrap();
        db.insert_billing(&Billing::for_consultation(
            consultation_id,
            patient_id,
            Charge {
                amount: 1000.0,
                payment_method: None,
            },
        ))
        .unwrap();

        Fixture {
            db,
            patient_id,
            doctor_id,
            receptionist_id,
            consultation_id,
        }
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_delete_patient_removes_dependents() {
        let f = setup();
        let summary = VisitEngine::new(&f.db).delete_patient(f.patient_id).unwrap();

        assert_eq!(
            summary,
            CascadeSummary {
                vitals: 1,
                appointments: 1,
                queue_entries: 1,
                consultations: 1,
                bills: 1,
            }
        );
        for table in ["vital_signs", "appointments", "queue", "consultations", "billing", "patients"] {
            assert_eq!(count(&f.db, table), 0, "{}", table);
        }
        assert_eq!(count(&f.db, "users"), 2);
    }

    #[test]
    fn test_delete_doctor_removes_their_records() {
        let f = setup();
        VisitEngine::new(&f.db).delete_staff(f.doctor_id).unwrap();

        for table in ["appointments", "queue", "consultations", "billing"] {
            assert_eq!(count(&f.db, table), 0, "{}", table);
        }
        assert_eq!(count(&f.db, "vital_signs"), 1);
        assert!(f.db.get_user(f.doctor_id).unwrap().is_none());
    }

    #[test]
    fn test_delete_receptionist_removes_recorded_vitals() {
        let f = setup();
        let summary = VisitEngine::new(&f.db).delete_staff(f.receptionist_id).unwrap();
        assert_eq!(summary.vitals, 1);
        assert_eq!(count(&f.db, "consultations"), 1);
    }

    #[test]
    fn test_admin_cannot_be_deleted() {
        let f = setup();
        let admin_id = f
            .db
            .insert_user(&User::new("Root".into(), "root@hospital.com".into(), "x".into(), Role::Admin, None))
            .unwrap();

        let err = VisitEngine::new(&f.db).delete_staff(admin_id).unwrap_err();
        assert!(matches!(err, FrontDeskError::Validation(_)));
        assert!(f.db.get_user(admin_id).unwrap().is_some());
    }

    #[test]
    fn test_delete_consultation_takes_bill() {
        let f = setup();
        let summary = VisitEngine::new(&f.db)
            .delete_consultation(f.consultation_id)
            .unwrap();
        assert_eq!(summary.bills, 1);
        assert_eq!(count(&f.db, "billing"), 0);
        assert_eq!(count(&f.db, "patients"), 1);
    }

    #[test]
    fn test_forced_failure_rolls_back_patient_delete() {
        let f = setup();
        f.db.conn()
            .execute_batch(
                "CREATE TRIGGER block_patient_delete BEFORE DELETE ON patients
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();

        assert!(VisitEngine::new(&f.db).delete_patient(f.patient_id).is_err());
        for table in ["vital_signs", "appointments", "queue", "consultations", "billing", "patients"] {
            assert_eq!(count(&f.db, table), 1, "{}", table);
        }
    }

    #[test]
    fn test_forced_failure_rolls_back_staff_delete() {
        let f = setup();
        f.db.conn()
            .execute_batch(
                "CREATE TRIGGER block_user_delete BEFORE DELETE ON users
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();

        assert!(VisitEngine::new(&f.db).delete_staff(f.doctor_id).is_err());
        for table in ["vital_signs", "appointments", "queue", "consultations", "billing", "patients"] {
            assert_eq!(count(&f.db, table), 1, "{}", table);
        }
        assert!(f.db.get_user(f.doctor_id).unwrap().is_some());
    }
}
