//! Consultation models.

use serde::{Deserialize, Serialize};

use super::timestamp_now;

/// A completed consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub symptoms: Option<String>,
    pub diagnosis: String,
    pub prescription: Option<String>,
    /// Opaque exam/test blob (usually JSON) captured by the exam-room form
    pub tests: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Clinical fields a doctor submits when closing a visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsultationNote {
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default, alias = "exam_data")]
    pub tests: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ConsultationNote {
    /// Diagnosis is the one required clinical field.
    pub fn has_diagnosis(&self) -> bool {
        !self.diagnosis.trim().is_empty()
    }
}

impl Consultation {
    pub fn new(patient_id: i64, doctor_id: i64, note: ConsultationNote) -> Self {
        Self {
            id: 0,
            patient_id,
            doctor_id,
            symptoms: note.symptoms,
            diagnosis: note.diagnosis,
            prescription: note.prescription,
            tests: note.tests,
            notes: note.notes,
            created_at: timestamp_now(),
        }
    }

    /// Apply an edit; absent fields keep their current value.
    pub fn apply(&mut self, edit: ConsultationEdit) {
        if let Some(symptoms) = edit.symptoms {
            self.symptoms = Some(symptoms);
        }
        if let Some(diagnosis) = edit.diagnosis {
            self.diagnosis = diagnosis;
        }
        if let Some(prescription) = edit.prescription {
            self.prescription = Some(prescription);
        }
        if let Some(tests) = edit.tests {
            self.tests = Some(tests);
        }
        if let Some(notes) = edit.notes {
            self.notes = Some(notes);
        }
    }
}

/// Partial edit by the authoring doctor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationEdit {
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    #[serde(alias = "exam_data")]
    pub tests: Option<String>,
    pub notes: Option<String>,
}

/// One entry of a patient's history, with the billed amount (0 when unbilled).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConsultationRecord {
    pub id: i64,
    pub patient_id: i64,
    pub symptoms: Option<String>,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub tests: Option<String>,
    pub notes: Option<String>,
    pub amount: f64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub created_at: String,
}
