//! Patient models.

use serde::{Deserialize, Serialize};

use super::{timestamp_now, BillLine, ConsultationRecord};

/// Patient demographics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    pub address: Option<String>,
    /// Clinic the patient is registered under (eye, ent, skin, ...)
    pub department: String,
    pub created_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, age: i64, gender: String, phone: String, department: String) -> Self {
        Self {
            id: 0,
            name,
            age,
            gender,
            phone,
            address: None,
            department,
            created_at: timestamp_now(),
        }
    }

    /// Demographic snapshot handed to a doctor when a consultation starts.
    pub fn snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            id: self.id,
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.clone(),
            department: self.department.clone(),
        }
    }
}

/// Registration or edit payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientForm {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    pub department: String,
}

impl PatientForm {
    pub fn into_patient(self) -> Patient {
        let mut patient = Patient::new(self.name, self.age, self.gender, self.phone, self.department);
        patient.address = self.address;
        patient
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSnapshot {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub department: String,
}

/// Patient record with billing history, for the front office.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientDetails {
    #[serde(flatten)]
    pub patient: Patient,
    pub last_session: Option<String>,
    pub bills: Vec<BillLine>,
}

/// Patient record with every consultation, newest first.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientHistory {
    pub patient: Patient,
    pub consultations: Vec<ConsultationRecord>,
}

/// Patient list row with the date of the most recent consultation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientSummary {
    #[serde(flatten)]
    pub patient: Patient,
    pub last_session: Option<String>,
}
