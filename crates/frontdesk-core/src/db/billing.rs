//! Billing database operations.
//!
//! A bill only moves forward: `pending` to `paid`. The schema trigger
//! `billing_status_forward` rejects any attempt to reopen a paid bill.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, decode, Database, DbError, DbResult};
use crate::models::{
    BillLine, Billing, BillingStatus, BillingView, DailyBill, PaymentMethod,
};

const BILLING_COLUMNS: &str =
    "id, consultation_id, patient_id, amount, status, payment_method, created_at";

/// Doctor name used when the consultation join cannot be resolved.
pub const UNKNOWN_DOCTOR: &str = "Unknown";

impl Database {
    /// Insert a bill, returning its ID.
    pub fn insert_billing(&self, billing: &Billing) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO billing (
                    consultation_id, patient_id, amount, status, payment_method, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    billing.consultation_id,
                    billing.patient_id,
                    billing.amount,
                    billing.status.as_str(),
                    billing.payment_method.map(PaymentMethod::as_str),
                    billing.created_at,
                ],
            )
            .map_err(|e| constraint(e, "billing"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a bill by ID.
    pub fn get_billing(&self, billing_id: i64) -> DbResult<Option<Billing>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM billing WHERE id = ?", BILLING_COLUMNS),
                [billing_id],
                billing_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Bill attached to a consultation, if any.
    pub fn get_billing_for_consultation(&self, consultation_id: i64) -> DbResult<Option<Billing>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM billing WHERE consultation_id = ? ORDER BY id LIMIT 1",
                    BILLING_COLUMNS
                ),
                [consultation_id],
                billing_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Record payment of a bill.
    pub fn mark_billing_paid(&self, billing_id: i64, method: PaymentMethod) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE billing SET status = ?2, payment_method = ?3 WHERE id = ?1",
            params![billing_id, BillingStatus::Paid.as_str(), method.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Bills with patient and doctor names, newest first.
    ///
    /// Falls back to a patient-only read with an unknown doctor when the
    /// consultation join fails.
    pub fn list_billing_views(&self) -> DbResult<Vec<BillingView>> {
        match self.joined_billing_views() {
            Ok(views) => Ok(views),
            Err(e) => {
                tracing::warn!(error = %e, "billing join failed, serving bills without doctor names");
                self.plain_billing_views()
            }
        }
    }

    pub(crate) fn joined_billing_views(&self) -> DbResult<Vec<BillingView>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT b.id, p.name, u.name, u.department, b.amount, b.status,
                   b.payment_method, b.created_at
            FROM billing b
            JOIN patients p ON p.id = b.patient_id
            JOIN consultations c ON c.id = b.consultation_id
            JOIN users u ON u.id = c.doctor_id
            ORDER BY b.created_at DESC, b.id DESC
            "#,
        )?;
        let rows = stmt.query_map([], billing_view_row)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?.try_into()?);
        }
        Ok(views)
    }

    pub(crate) fn plain_billing_views(&self) -> DbResult<Vec<BillingView>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT b.id, p.name, '{}', NULL, b.amount, b.status,
                   b.payment_method, b.created_at
            FROM billing b
            JOIN patients p ON p.id = b.patient_id
            ORDER BY b.created_at DESC, b.id DESC
            "#,
            UNKNOWN_DOCTOR
        ))?;
        let rows = stmt.query_map([], billing_view_row)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?.try_into()?);
        }
        Ok(views)
    }

    /// All bills for a patient in creation order.
    pub fn bills_for_patient(&self, patient_id: i64) -> DbResult<Vec<BillLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT amount, status, created_at FROM billing WHERE patient_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut lines = Vec::new();
        for row in rows {
            let (amount, status, created_at) = row?;
            lines.push(BillLine {
                amount,
                status: decode(&status, BillingStatus::parse, "billing status")?,
                created_at,
            });
        }
        Ok(lines)
    }

    /// Bills created on `day` with patient name and department, newest first.
    pub fn bills_created_on(&self, day: NaiveDate) -> DbResult<Vec<DailyBill>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.name, p.department, b.amount, b.status
            FROM billing b
            JOIN patients p ON p.id = b.patient_id
            WHERE date(b.created_at) = ?
            ORDER BY b.created_at DESC, b.id DESC
            "#,
        )?;
        let rows = stmt.query_map([day], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut bills = Vec::new();
        for row in rows {
            let (patient, department, amount, status) = row?;
            bills.push(DailyBill {
                patient,
                department,
                amount,
                status: decode(&status, BillingStatus::parse, "billing status")?,
            });
        }
        Ok(bills)
    }

    /// Count bills in a given status.
    pub fn count_bills_with_status(&self, status: BillingStatus) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM billing WHERE status = ?",
            [status.as_str()],
            |row| row.get(0),
        )?)
    }

    /// Sum of paid bills created within `[start, end]`.
    pub fn paid_revenue_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<f64> {
        Ok(self.conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM billing
            WHERE status = ?3 AND date(created_at) BETWEEN ?1 AND ?2
            "#,
            params![start, end, BillingStatus::Paid.as_str()],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn delete_billing_for_consultation(&self, consultation_id: i64) -> DbResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM billing WHERE consultation_id = ?",
            [consultation_id],
        )?)
    }
}

struct BillingRow {
    id: i64,
    consultation_id: i64,
    patient_id: i64,
    amount: f64,
    status: String,
    payment_method: Option<String>,
    created_at: String,
}

fn billing_row(row: &Row<'_>) -> rusqlite::Result<BillingRow> {
    Ok(BillingRow {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        patient_id: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        payment_method: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl TryFrom<BillingRow> for Billing {
    type Error = DbError;

    fn try_from(row: BillingRow) -> Result<Self, Self::Error> {
        Ok(Billing {
            id: row.id,
            consultation_id: row.consultation_id,
            patient_id: row.patient_id,
            amount: row.amount,
            status: decode(&row.status, BillingStatus::parse, "billing status")?,
            payment_method: row
                .payment_method
                .as_deref()
                .map(|m| decode(m, PaymentMethod::parse, "payment method"))
                .transpose()?,
            created_at: row.created_at,
        })
    }
}

struct BillingViewRow {
    id: i64,
    patient_name: String,
    doctor_name: String,
    department: Option<String>,
    amount: f64,
    status: String,
    payment_method: Option<String>,
    created_at: String,
}

fn billing_view_row(row: &Row<'_>) -> rusqlite::Result<BillingViewRow> {
    Ok(BillingViewRow {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        doctor_name: row.get(2)?,
        department: row.get(3)?,
        amount: row.get(4)?,
        status: row.get(5)?,
        payment_method: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl TryFrom<BillingViewRow> for BillingView {
    type Error = DbError;

    fn try_from(row: BillingViewRow) -> Result<Self, Self::Error> {
        Ok(BillingView {
            id: row.id,
            patient_name: row.patient_name,
            doctor_name: row.doctor_name,
            department: row.department,
            amount: row.amount,
            status: decode(&row.status, BillingStatus::parse, "billing status")?,
            payment_method: row
                .payment_method
                .as_deref()
                .map(|m| decode(m, PaymentMethod::parse, "payment method"))
                .transpose()?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Charge, Consultation, ConsultationNote, Department, Patient, Role, User};

    struct Fixture {
        db: Database,
        patient_id: i64,
        consultation_id: i64,
    }

    fn setup_db() -> Fixture {
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
        Fixture {
            db,
            patient_id,
            consultation_id,
        }
    }

    fn bill(f: &Fixture, amount: f64, created_at: &str) -> Billing {
        let mut billing = Billing::for_consultation(
            f.consultation_id,
            f.patient_id,
            Charge {
                amount,
                payment_method: None,
            },
        );
        billing.created_at = created_at.into();
        billing
    }

    #[test]
    fn test_mark_paid() {
        let f = setup_db();
        let id = f
            .db
            .insert_billing(&bill(&f, 1000.0, "2024-01-15T10:00:00.000000Z"))
            .unwrap();

        assert!(f.db.mark_billing_paid(id, PaymentMethod::Mpesa).unwrap());
        let paid = f.db.get_billing(id).unwrap().unwrap();
        assert!(paid.is_paid());
        assert_eq!(paid.payment_method, Some(PaymentMethod::Mpesa));
        assert!(!f.db.mark_billing_paid(id + 100, PaymentMethod::Cash).unwrap());
    }

    #[test]
    fn test_revenue_counts_paid_only() {
        let f = setup_db();
        for (amount, paid) in [(500.0, true), (1500.0, true), (300.0, false)] {
            let id = f
                .db
                .insert_billing(&bill(&f, amount, "2024-01-15T10:00:00.000000Z"))
                .unwrap();
            if paid {
                f.db.mark_billing_paid(id, PaymentMethod::Cash).unwrap();
            }
        }

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(f.db.paid_revenue_between(day, day).unwrap(), 2000.0);
        let before = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(f.db.paid_revenue_between(before, before).unwrap(), 0.0);
        assert_eq!(f.db.count_bills_with_status(BillingStatus::Pending).unwrap(), 1);
    }

    #[test]
    fn test_views_and_fallback() {
        let f = setup_db();
        f.db.insert_billing(&bill(&f, 1000.0, "2024-01-15T10:00:00.000000Z"))
            .unwrap();

        let joined = f.db.list_billing_views().unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].doctor_name, "Dr. Smith");
        assert_eq!(joined[0].department.as_deref(), Some("eye"));

        let plain = f.db.plain_billing_views().unwrap();
        assert_eq!(plain[0].patient_name, "Jane Doe");
        assert_eq!(plain[0].doctor_name, UNKNOWN_DOCTOR);
    }

    #[test]
    fn test_daily_summary_and_patient_bills() {
        let f = setup_db();
        f.db.insert_billing(&bill(&f, 200.0, "2024-01-14T10:00:00.000000Z"))
            .unwrap();
        f.db.insert_billing(&bill(&f, 1000.0, "2024-01-15T10:00:00.000000Z"))
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let summary = f.db.bills_created_on(day).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].patient, "Jane Doe");
        assert_eq!(summary[0].amount, 1000.0);

        assert_eq!(f.db.bills_for_patient(f.patient_id).unwrap().len(), 2);
    }
}
