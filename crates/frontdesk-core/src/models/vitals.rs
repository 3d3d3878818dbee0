//! Vital signs snapshots (append-only).

use serde::{Deserialize, Serialize};

use super::timestamp_now;

/// Measured vital signs. Every field is optional at capture time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalsReading {
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<i64>,
    pub temperature: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub oxygen_saturation: Option<i64>,
}

/// A stored vitals record. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub id: i64,
    pub patient_id: i64,
    #[serde(flatten)]
    pub reading: VitalsReading,
    pub recorded_by: i64,
    pub created_at: String,
}

impl VitalSigns {
    pub fn new(patient_id: i64, recorded_by: i64, reading: VitalsReading) -> Self {
        Self {
            id: 0,
            patient_id,
            reading,
            recorded_by,
            created_at: timestamp_now(),
        }
    }
}

/// Vitals record joined with the recorder's name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VitalsEntry {
    pub id: i64,
    #[serde(flatten)]
    pub reading: VitalsReading,
    pub recorded_by: String,
    pub created_at: String,
}
