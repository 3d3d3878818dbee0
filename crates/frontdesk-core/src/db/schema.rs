//! SQLite schema definition.

/// Complete database schema for the front desk.
///
/// Foreign keys have no `ON DELETE` actions: dependents are removed explicitly by the
/// cascade routines in `visits`, so a missed dependent aborts the delete instead of
/// silently orphaning or dropping rows.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Staff
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'doctor', 'receptionist')),
    department TEXT CHECK (department IN ('eye', 'ent', 'skin', 'reception')),
    schedule TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role, department);
CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL,
    phone TEXT NOT NULL,
    address TEXT,
    department TEXT NOT NULL,                     -- classification only, not a key
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_department ON patients(department);

-- ============================================================================
-- Vital Signs (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS vital_signs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    blood_pressure TEXT,
    heart_rate INTEGER,
    temperature REAL,
    weight REAL,
    height REAL,
    oxygen_saturation INTEGER,
    recorded_by INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vitals_patient ON vital_signs(patient_id, created_at);
CREATE INDEX IF NOT EXISTS idx_vitals_recorder ON vital_signs(recorded_by);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES users(id),
    date TEXT NOT NULL,                           -- YYYY-MM-DD
    time TEXT NOT NULL,                           -- HH:MM:SS
    status TEXT NOT NULL DEFAULT 'scheduled' CHECK (status IN ('scheduled', 'completed')),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_visit ON appointments(patient_id, doctor_id, date);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id, date);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES users(id),
    symptoms TEXT,
    diagnosis TEXT NOT NULL,
    prescription TEXT,
    tests TEXT,                                   -- opaque exam data, usually JSON
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id, created_at);
CREATE INDEX IF NOT EXISTS idx_consultations_doctor ON consultations(doctor_id, created_at);

-- ============================================================================
-- Billing
-- ============================================================================

CREATE TABLE IF NOT EXISTS billing (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    consultation_id INTEGER NOT NULL REFERENCES consultations(id),
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    amount REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'paid')),
    payment_method TEXT CHECK (payment_method IN ('cash', 'mpesa', 'card')),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_billing_consultation ON billing(consultation_id);
CREATE INDEX IF NOT EXISTS idx_billing_patient ON billing(patient_id);
CREATE INDEX IF NOT EXISTS idx_billing_created ON billing(created_at);

-- Bills never move back from paid to pending
CREATE TRIGGER IF NOT EXISTS billing_status_forward BEFORE UPDATE OF status ON billing
WHEN old.status = 'paid' AND new.status <> 'paid'
BEGIN
    SELECT RAISE(ABORT, 'Paid bills cannot be reopened');
END;

-- ============================================================================
-- Doctor Queue
-- ============================================================================

CREATE TABLE IF NOT EXISTS queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES users(id),
    status TEXT NOT NULL DEFAULT 'waiting' CHECK (status IN ('waiting', 'in_progress')),
    priority INTEGER NOT NULL DEFAULT 0,          -- stored only, reads are FIFO
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_doctor ON queue(doctor_id, created_at);
CREATE INDEX IF NOT EXISTS idx_queue_visit ON queue(patient_id, doctor_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_role_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO users (name, email, password_hash, role, created_at)
             VALUES ('Nurse', 'n@x', 'h', 'nurse', '2024-01-15T10:00:00.000000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_queue_requires_existing_patient() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO queue (patient_id, doctor_id, created_at)
             VALUES (99, 99, '2024-01-15T10:00:00.000000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_paid_bill_cannot_reopen() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
                VALUES (1, 'Dr. Smith', 's@x', 'h', 'doctor', '2024-01-15T10:00:00.000000Z');
            INSERT INTO patients (id, name, age, gender, phone, department, created_at)
                VALUES (1, 'Jane Doe', 30, 'female', '0700', 'eye', '2024-01-15T10:00:00.000000Z');
            INSERT INTO consultations (id, patient_id, doctor_id, diagnosis, created_at)
                VALUES (1, 1, 1, 'Conjunctivitis', '2024-01-15T10:00:00.000000Z');
            INSERT INTO billing (id, consultation_id, patient_id, amount, status, created_at)
                VALUES (1, 1, 1, 1000, 'paid', '2024-01-15T10:00:00.000000Z');
            "#,
        )
        .unwrap();

        let result = conn.execute("UPDATE billing SET status = 'pending' WHERE id = 1", []);
        assert!(result.is_err());
    }
}
