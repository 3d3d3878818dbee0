//! Doctor visit queue models.

use serde::{Deserialize, Serialize};

use super::timestamp_now;

/// Priority stored for walk-ins. Stored only; reads are FIFO.
pub const WALK_IN_PRIORITY: i64 = 0;
/// Priority stored for entries converted from an appointment.
pub const APPOINTMENT_PRIORITY: i64 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InProgress,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "in_progress" => Some(Self::InProgress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub status: QueueStatus,
    pub priority: i64,
    pub created_at: String,
}

impl QueueEntry {
    /// A waiting walk-in entry.
    pub fn walk_in(patient_id: i64, doctor_id: i64) -> Self {
        Self {
            id: 0,
            patient_id,
            doctor_id,
            status: QueueStatus::Waiting,
            priority: WALK_IN_PRIORITY,
            created_at: timestamp_now(),
        }
    }

    /// A waiting entry created from an existing appointment.
    pub fn from_appointment(patient_id: i64, doctor_id: i64) -> Self {
        Self {
            priority: APPOINTMENT_PRIORITY,
            ..Self::walk_in(patient_id, doctor_id)
        }
    }
}

/// Queue entry joined with patient and doctor names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueueView {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub department: Option<String>,
    pub status: QueueStatus,
    pub priority: i64,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_appointment_sets_priority() {
        let entry = QueueEntry::from_appointment(1, 2);
        assert_eq!(entry.priority, APPOINTMENT_PRIORITY);
        assert_eq!(entry.status, QueueStatus::Waiting);
        assert_eq!(QueueEntry::walk_in(1, 2).priority, WALK_IN_PRIORITY);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&QueueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
