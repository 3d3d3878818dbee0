//! Billing models.

use serde::{Deserialize, Serialize};

use super::timestamp_now;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    Pending,
    Paid,
}

impl BillingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Mpesa,
    Card,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Mpesa => "mpesa",
            Self::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "mpesa" => Some(Self::Mpesa),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

/// A bill attached to exactly one consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Billing {
    pub id: i64,
    pub consultation_id: i64,
    /// Copy of the consultation's patient, set only by [`Billing::for_consultation`]
    pub patient_id: i64,
    pub amount: f64,
    pub status: BillingStatus,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: String,
}

/// Charge submitted alongside a consultation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Charge {
    pub amount: f64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl Billing {
    /// Pending bill for a consultation. The patient is always taken from the
    /// consultation so the denormalized column cannot drift.
    pub fn for_consultation(consultation_id: i64, consultation_patient_id: i64, charge: Charge) -> Self {
        Self {
            id: 0,
            consultation_id,
            patient_id: consultation_patient_id,
            amount: charge.amount,
            status: BillingStatus::Pending,
            payment_method: Some(charge.payment_method.unwrap_or_default()),
            created_at: timestamp_now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillingStatus::Paid
    }
}

/// Bill joined with patient and doctor names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BillingView {
    pub id: i64,
    pub patient_name: String,
    pub doctor_name: String,
    pub department: Option<String>,
    pub amount: f64,
    pub status: BillingStatus,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: String,
}

/// Short bill line shown on patient details.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BillLine {
    pub amount: f64,
    pub status: BillingStatus,
    pub created_at: String,
}

/// One row of the front desk's billing summary for a day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyBill {
    pub patient: String,
    pub department: String,
    pub amount: f64,
    pub status: BillingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_consultation_defaults_to_cash_pending() {
        let bill = Billing::for_consultation(
            10,
            3,
            Charge {
                amount: 1000.0,
                payment_method: None,
            },
        );
        assert_eq!(bill.patient_id, 3);
        assert_eq!(bill.status, BillingStatus::Pending);
        assert_eq!(bill.payment_method, Some(PaymentMethod::Cash));
        assert!(!bill.is_paid());
    }

    #[test]
    fn test_payment_method_strings() {
        assert_eq!(PaymentMethod::parse("mpesa"), Some(PaymentMethod::Mpesa));
        assert_eq!(PaymentMethod::Card.as_str(), "card");
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }
}
