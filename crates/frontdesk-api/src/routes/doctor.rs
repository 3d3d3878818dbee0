//! `/api/doctor/*` endpoints. Every call is scoped to the session's own user.

use axum::extract::State;
use axum::response::Response;
use axum::{Extension, Json};
use frontdesk_core::auth::DoctorOnly;
use frontdesk_core::models::{
    Charge, ConsultationEdit, ConsultationNote, PatientHistory, PatientSummary, PaymentMethod,
    UserProfile,
};
use frontdesk_core::reporting::DoctorDashboard;
use frontdesk_core::{AppointmentView, Patient, QueueView};
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::{change_password_for, ChangePasswordRequest};
use super::{success_message, RangeQuery};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::session::Session;
use crate::AppState;

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<DoctorDashboard>, ApiError> {
    let range = query.range()?;
    Ok(Json(state.desk.doctor_dashboard(&session.principal, range)?))
}

pub async fn start_consultation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(queue_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let patient = state.desk.start_consultation(&session.principal, queue_id)?;
    Ok(Json(json!({ "success": true, "patient": patient })))
}

/// Billed amount as the consultation form sends it: a number, a numeric
/// string, or an empty string for "no charge".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn value(&self) -> Result<Option<f64>, ApiError> {
        match self {
            Amount::Number(n) => Ok(Some(*n)),
            Amount::Text(s) if s.trim().is_empty() => Ok(None),
            Amount::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("Invalid amount: {}", s))),
        }
    }
}

/// Consultation form body. `exam_data` is stored as the consultation's tests.
#[derive(Debug, Deserialize)]
pub struct SaveConsultationRequest {
    pub patient_id: i64,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub exam_data: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl SaveConsultationRequest {
    fn note(&self) -> ConsultationNote {
        ConsultationNote {
            symptoms: self.symptoms.clone(),
            diagnosis: self.diagnosis.clone(),
            prescription: self.prescription.clone(),
            tests: self.exam_data.clone(),
            notes: self.notes.clone(),
        }
    }

    fn charge(&self) -> Result<Option<Charge>, ApiError> {
        let amount = match &self.amount {
            Some(amount) => amount.value()?,
            None => None,
        };
        Ok(amount.map(|amount| Charge {
            amount,
            payment_method: self.payment_method,
        }))
    }
}

pub async fn save_consultation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<SaveConsultationRequest>,
) -> Result<Json<Value>, ApiError> {
    let charge = req.charge()?;
    let saved = state
        .desk
        .save_consultation(&session.principal, req.patient_id, req.note(), charge)?;
    Ok(Json(json!({
        "success": true,
        "message": "Consultation completed successfully",
        "consultation_id": saved.consultation_id,
        "billing_id": saved.billing_id,
    })))
}

pub async fn patient_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<PatientHistory>, ApiError> {
    Ok(Json(state.desk.patient_history(&session.principal, patient_id)?))
}

pub async fn my_patients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    Ok(Json(state.desk.my_patients(&session.principal)?))
}

pub async fn queue(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<QueueView>>, ApiError> {
    Ok(Json(state.desk.my_queue(&session.principal)?))
}

pub async fn appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(state.desk.my_appointments(&session.principal)?))
}

pub async fn patient_details(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.desk.patient(&session.principal, patient_id)?))
}

pub async fn update_consultation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(consultation_id): ApiPath<i64>,
    ApiJson(edit): ApiJson<ConsultationEdit>,
) -> Result<Json<Value>, ApiError> {
    state
        .desk
        .update_consultation(&session.principal, consultation_id, edit)?;
    Ok(success_message("Consultation updated successfully"))
}

pub async fn doctor_info(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.desk.doctor_info(&session.principal)?))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    session.principal.require::<DoctorOnly>()?;
    change_password_for(&state, &session, &req)
}
