//! Appointment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::timestamp_now;

/// Appointment status. Cancellation deletes the row, so there is no cancelled state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    /// Day of the visit (distinct from `created_at`)
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: String,
}

impl Appointment {
    pub fn new(patient_id: i64, doctor_id: i64, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            id: 0,
            patient_id,
            doctor_id,
            date,
            time,
            status: AppointmentStatus::Scheduled,
            created_at: timestamp_now(),
        }
    }
}

/// Appointment joined with patient and doctor names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentView {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    /// Doctor's department when set, else the patient's
    pub department: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}
