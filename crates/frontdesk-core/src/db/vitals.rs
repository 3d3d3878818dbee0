//! Vital signs database operations (append-only).

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, Database, DbResult};
use crate::models::{VitalSigns, VitalsEntry, VitalsReading};

/// Placeholder shown when a recorder account no longer resolves.
pub const UNKNOWN_RECORDER: &str = "Unknown";

/// Shown in history listings for snapshots taken without a blood pressure.
pub const MISSING_BLOOD_PRESSURE: &str = "N/A";

impl Database {
    /// Append a vitals snapshot, returning its ID.
    pub fn insert_vitals(&self, vitals: &VitalSigns) -> DbResult<i64> {
        let reading = &vitals.reading;
        self.conn
            .execute(
                r#"
                INSERT INTO vital_signs (
                    patient_id, blood_pressure, heart_rate, temperature,
                    weight, height, oxygen_saturation, recorded_by, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    vitals.patient_id,
                    reading.blood_pressure,
                    reading.heart_rate,
                    reading.temperature,
                    reading.weight,
                    reading.height,
                    reading.oxygen_saturation,
                    vitals.recorded_by,
                    vitals.created_at,
                ],
            )
            .map_err(|e| constraint(e, "vitals"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Vitals history for a patient, newest first, with the recorder's name.
    pub fn list_vitals_for_patient(&self, patient_id: i64) -> DbResult<Vec<VitalsEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT v.id, v.blood_pressure, v.heart_rate, v.temperature, v.weight,
                   v.height, v.oxygen_saturation, u.name, v.created_at
            FROM vital_signs v
            LEFT JOIN users u ON u.id = v.recorded_by
            WHERE v.patient_id = ?
            ORDER BY v.created_at DESC, v.id DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], vitals_entry_row)?;
        let mut history = rows.collect::<Result<Vec<_>, _>>()?;
        for entry in &mut history {
            entry
                .reading
                .blood_pressure
                .get_or_insert_with(|| MISSING_BLOOD_PRESSURE.to_string());
        }
        Ok(history)
    }

    /// Most recent vitals snapshot for a patient.
    pub fn latest_vitals(&self, patient_id: i64) -> DbResult<Option<VitalsEntry>> {
        self.conn
            .query_row(
                r#"
                SELECT v.id, v.blood_pressure, v.heart_rate, v.temperature, v.weight,
                       v.height, v.oxygen_saturation, u.name, v.created_at
                FROM vital_signs v
                LEFT JOIN users u ON u.id = v.recorded_by
                WHERE v.patient_id = ?
                ORDER BY v.created_at DESC, v.id DESC
                LIMIT 1
                "#,
                [patient_id],
                vitals_entry_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub(crate) fn delete_vitals_for_patient(&self, patient_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM vital_signs WHERE patient_id = ?", [patient_id])?)
    }

    pub(crate) fn delete_vitals_recorded_by(&self, user_id: i64) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM vital_signs WHERE recorded_by = ?", [user_id])?)
    }
}

fn vitals_entry_row(row: &Row<'_>) -> rusqlite::Result<VitalsEntry> {
    let recorder: Option<String> = row.get(7)?;
    Ok(VitalsEntry {
        id: row.get(0)?,
        reading: VitalsReading {
            blood_pressure: row.get(1)?,
            heart_rate: row.get(2)?,
            temperature: row.get(3)?,
            weight: row.get(4)?,
            height: row.get(5)?,
            oxygen_saturation: row.get(6)?,
        },
        recorded_by: recorder.unwrap_or_else(|| UNKNOWN_RECORDER.to_string()),
        created_at: row.get(8)?,
    })
}
