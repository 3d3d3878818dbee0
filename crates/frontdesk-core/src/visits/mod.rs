//! Visit lifecycle.
//!
//! ```text
//!   Appointment (scheduled) ──queue_appointment──┐
//!                                                ▼
//!   walk-in ───────────────queue_walk_in────▶ Queue (waiting)
//!                                                │ start_consultation
//!                                                ▼
//!                                          Queue (in_progress)
//!                                                │ save_consultation
//!                                                ▼
//!                            Consultation ──▶ Billing (pending) ──▶ paid
//! ```
//!
//! Saving a consultation closes the visit thread for the (patient, doctor)
//! pair in one transaction: consultation, optional bill, queue cleared and
//! today's appointments completed.

mod cascade;

pub use cascade::CascadeSummary;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    today, Appointment, Billing, Charge, Consultation, ConsultationEdit, ConsultationNote,
    PatientSnapshot, QueueEntry, QueueStatus, Role,
};
use crate::FrontDeskError;

/// IDs written by a successful consultation save.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SavedConsultation {
    pub consultation_id: i64,
    pub billing_id: Option<i64>,
}

/// Write paths of the visit lifecycle over one database handle.
pub struct VisitEngine<'a> {
    db: &'a Database,
    today: NaiveDate,
}

impl<'a> VisitEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::on(db, today())
    }

    /// Engine whose notion of "today" is fixed to `day`.
    pub fn on(db: &'a Database, day: NaiveDate) -> Self {
        Self { db, today: day }
    }

    // =========================================================================
    // Booking and queueing
    // =========================================================================

    /// Book an appointment by patient and doctor name.
    pub fn book_appointment(
        &self,
        patient_name: &str,
        doctor_name: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<i64, FrontDeskError> {
        let (patient_id, doctor_id) = self.resolve_names(patient_name, doctor_name)?;
        let id = self
            .db
            .insert_appointment(&Appointment::new(patient_id, doctor_id, date, time))?;
        tracing::info!(appointment_id = id, patient_id, doctor_id, %date, "appointment booked");
        Ok(id)
    }

    /// Queue a walk-in by patient and doctor name.
    pub fn queue_walk_in(&self, patient_name: &str, doctor_name: &str) -> Result<i64, FrontDeskError> {
        let (patient_id, doctor_id) = self.resolve_names(patient_name, doctor_name)?;
        let id = self
            .db
            .insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor_id))?;
        tracing::info!(queue_id = id, patient_id, doctor_id, "walk-in queued");
        Ok(id)
    }

    /// Queue the patient of an existing appointment with its doctor.
    ///
    /// The appointment stays scheduled until a consultation is saved on its date.
    pub fn queue_appointment(&self, appointment_id: i64) -> Result<i64, FrontDeskError> {
        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Appointment {}", appointment_id)))?;
        let id = self.db.insert_queue_entry(&QueueEntry::from_appointment(
            appointment.patient_id,
            appointment.doctor_id,
        ))?;
        tracing::info!(queue_id = id, appointment_id, "appointment queued");
        Ok(id)
    }

    pub fn remove_from_queue(&self, queue_id: i64) -> Result<(), FrontDeskError> {
        if !self.db.delete_queue_entry_row(queue_id)? {
            return Err(FrontDeskError::NotFound(format!("Queue entry {}", queue_id)));
        }
        Ok(())
    }

    /// Cancelling is a hard delete.
    pub fn cancel_appointment(&self, appointment_id: i64) -> Result<(), FrontDeskError> {
        if !self.db.delete_appointment_row(appointment_id)? {
            return Err(FrontDeskError::NotFound(format!("Appointment {}", appointment_id)));
        }
        tracing::info!(appointment_id, "appointment cancelled");
        Ok(())
    }

    // =========================================================================
    // Consultation
    // =========================================================================

    /// Move a queue entry to in-progress and return the patient's demographics.
    pub fn start_consultation(&self, doctor_id: i64, queue_id: i64) -> Result<PatientSnapshot, FrontDeskError> {
        let entry = self
            .db
            .get_queue_entry(queue_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Queue entry {}", queue_id)))?;
        if entry.doctor_id != doctor_id {
            return Err(FrontDeskError::Authorization(
                "Queue entry belongs to another doctor".into(),
            ));
        }
        let patient = self
            .db
            .get_patient(entry.patient_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Patient {}", entry.patient_id)))?;

        self.db.set_queue_status(queue_id, QueueStatus::InProgress)?;
        tracing::info!(queue_id, patient_id = patient.id, doctor_id, "consultation started");
        Ok(patient.snapshot())
    }

    /// Record a consultation and close the visit thread.
    ///
    /// A bill is written only for a positive amount. Its patient is copied from
    /// the consultation just inserted.
    pub fn save_consultation(
        &self,
        doctor_id: i64,
        patient_id: i64,
        note: ConsultationNote,
        charge: Option<Charge>,
    ) -> Result<SavedConsultation, FrontDeskError> {
        if !note.has_diagnosis() {
            return Err(FrontDeskError::Validation("Diagnosis is required".into()));
        }
        let charge = match charge {
            Some(c) if !c.amount.is_finite() || c.amount < 0.0 => {
                return Err(FrontDeskError::Validation(
                    "Amount must be a non-negative number".into(),
                ));
            }
            Some(c) if c.amount > 0.0 => Some(c),
            _ => None,
        };
        if self.db.get_patient(patient_id)?.is_none() {
            return Err(FrontDeskError::NotFound(format!("Patient {}", patient_id)));
        }
        match self.db.get_user(doctor_id)? {
            Some(user) if user.role == Role::Doctor => {}
            _ => return Err(FrontDeskError::NotFound(format!("Doctor {}", doctor_id))),
        }

        let today = self.today;
        let saved = self.db.atomically(|db| {
            let mut consultation = Consultation::new(patient_id, doctor_id, note);
            consultation.id = db.insert_consultation(&consultation)?;

            let billing_id = match charge {
                Some(charge) => Some(db.insert_billing(&Billing::for_consultation(
                    consultation.id,
                    consultation.patient_id,
                    charge,
                ))?),
                None => None,
            };

            db.delete_queue_for_visit(patient_id, doctor_id)?;
            db.complete_appointments(patient_id, doctor_id, today)?;

            Ok::<_, FrontDeskError>(SavedConsultation {
                consultation_id: consultation.id,
                billing_id,
            })
        })?;

        tracing::info!(
            consultation_id = saved.consultation_id,
            billed = saved.billing_id.is_some(),
            patient_id,
            doctor_id,
            "consultation saved"
        );
        Ok(saved)
    }

    /// Edit a consultation. Only its author may do so.
    pub fn update_consultation(
        &self,
        doctor_id: i64,
        consultation_id: i64,
        edit: ConsultationEdit,
    ) -> Result<Consultation, FrontDeskError> {
        let mut consultation = self
            .db
            .get_consultation(consultation_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Consultation {}", consultation_id)))?;
        if consultation.doctor_id != doctor_id {
            return Err(FrontDeskError::Authorization(
                "You can only edit your own consultations".into(),
            ));
        }

        consultation.apply(edit);
        if consultation.diagnosis.trim().is_empty() {
            return Err(FrontDeskError::Validation("Diagnosis is required".into()));
        }
        self.db.update_consultation(&consultation)?;
        Ok(consultation)
    }

    fn resolve_names(&self, patient_name: &str, doctor_name: &str) -> Result<(i64, i64), FrontDeskError> {
        let patient = self.db.find_patient_by_name(patient_name)?;
        let doctor = self.db.find_doctor_by_name(doctor_name)?;
        match (patient, doctor) {
            (Some(patient), Some(doctor)) => Ok((patient.id, doctor.id)),
            _ => Err(FrontDeskError::Validation("Patient or Doctor not found".into())),
        }
    }
}
