//! `/api/receptionist/*` endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use frontdesk_core::models::{
    parse_date, parse_time, Department, DoctorRef, PatientDetails, PatientForm, PatientSummary,
    PaymentMethod,
};
use frontdesk_core::reporting::{QuickDashboard, ReceptionistSummary};
use frontdesk_core::{AppointmentView, BillingView, QueueView};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{success, success_message, RangeQuery};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::session::Session;
use crate::AppState;

pub async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<ReceptionistSummary>, ApiError> {
    let range = query.range()?;
    Ok(Json(state.desk.receptionist_summary(&session.principal, range)?))
}

pub async fn quick_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<QuickDashboard>, ApiError> {
    Ok(Json(state.desk.quick_dashboard(&session.principal)?))
}

pub async fn register_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(form): ApiJson<PatientForm>,
) -> Result<Json<Value>, ApiError> {
    let patient_id = state.desk.register_patient(&session.principal, form)?;
    Ok(Json(json!({ "success": true, "patient_id": patient_id })))
}

/// Patient and doctor picked by display name, as the booking form sends them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitByName {
    pub patient_name: String,
    pub doctor_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentRequest {
    #[serde(flatten)]
    pub visit: VisitByName,
    pub date: String,
    pub time: String,
}

pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<AppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = parse_date(&req.date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date: {}", req.date)))?;
    let time = parse_time(&req.time)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid time: {}", req.time)))?;
    let appointment_id = state.desk.book_appointment(
        &session.principal,
        &req.visit.patient_name,
        &req.visit.doctor_name,
        date,
        time,
    )?;
    Ok(Json(json!({ "success": true, "appointment_id": appointment_id })))
}

pub async fn patients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    Ok(Json(state.desk.patient_summaries(&session.principal)?))
}

/// Bills with patient and doctor names, newest first.
pub async fn billing(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<BillingView>>, ApiError> {
    Ok(Json(state.desk.billing(&session.principal)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl MarkPaidRequest {
    /// An empty body means "no method given"; anything else must parse.
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid payment request: {}", e)))
    }
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(billing_id): ApiPath<i64>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req = MarkPaidRequest::from_body(&body)?;
    state
        .desk
        .mark_bill_paid(&session.principal, billing_id, req.payment_method)?;
    Ok(success())
}

pub async fn doctors(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(department): ApiPath<String>,
) -> Result<Json<Vec<DoctorRef>>, ApiError> {
    let department = Department::parse(&department)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown department: {}", department)))?;
    Ok(Json(state.desk.doctors_in_department(&session.principal, department)?))
}

pub async fn appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(state.desk.appointments(&session.principal)?))
}

pub async fn queue(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<QueueView>>, ApiError> {
    Ok(Json(state.desk.queue(&session.principal)?))
}

/// Walk-in: queue a patient for a doctor without an appointment.
pub async fn add_to_queue(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<VisitByName>,
) -> Result<Json<Value>, ApiError> {
    let queue_id = state
        .desk
        .add_walk_in(&session.principal, &req.patient_name, &req.doctor_name)?;
    Ok(Json(json!({ "success": true, "queue_id": queue_id })))
}

pub async fn queue_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(appointment_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let queue_id = state.desk.queue_appointment(&session.principal, appointment_id)?;
    Ok(Json(json!({ "success": true, "queue_id": queue_id })))
}

pub async fn patient_names(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.desk.patient_names(&session.principal)?))
}

pub async fn doctor_names(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.desk.doctor_names(&session.principal)?))
}

pub async fn patient_details(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<PatientDetails>, ApiError> {
    Ok(Json(state.desk.patient_details(&session.principal, patient_id)?))
}

pub async fn remove_from_queue(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(queue_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.desk.remove_from_queue(&session.principal, queue_id)?;
    Ok(success_message("Patient removed from queue"))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(appointment_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.desk.cancel_appointment(&session.principal, appointment_id)?;
    Ok(success_message("Appointment cancelled"))
}
