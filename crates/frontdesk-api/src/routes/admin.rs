//! `/api/admin/*` endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use frontdesk_core::models::{Department, NewStaff, PatientDetails, PatientForm, Role, StaffUpdate};
use frontdesk_core::reporting::{AdminSummary, HospitalOverview};
use frontdesk_core::{AppointmentView, BillingView, Patient, User};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{success_message, RangeQuery};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::session::Session;
use crate::AppState;

pub async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<AdminSummary>, ApiError> {
    let range = query.range()?;
    Ok(Json(state.desk.admin_summary(&session.principal, range)?))
}

pub async fn hospital_overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<HospitalOverview>, ApiError> {
    Ok(Json(state.desk.hospital_overview(&session.principal)?))
}

pub async fn all_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.desk.list_staff(&session.principal)?))
}

#[derive(Debug, Deserialize)]
pub struct DoctorForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: Department,
    #[serde(default)]
    pub schedule: Option<String>,
}

pub async fn register_doctor(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(form): ApiJson<DoctorForm>,
) -> Result<Json<Value>, ApiError> {
    let staff = NewStaff {
        name: form.name,
        email: form.email,
        password: form.password,
        role: Role::Doctor,
        department: Some(form.department),
        schedule: form.schedule,
    };
    let user_id = state.desk.register_staff(&session.principal, staff)?;
    Ok(registered(user_id, "Doctor registered successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ReceptionistForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn register_receptionist(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(form): ApiJson<ReceptionistForm>,
) -> Result<Json<Value>, ApiError> {
    let staff = NewStaff {
        name: form.name,
        email: form.email,
        password: form.password,
        role: Role::Receptionist,
        department: Some(Department::Reception),
        schedule: None,
    };
    let user_id = state.desk.register_staff(&session.principal, staff)?;
    Ok(registered(user_id, "Receptionist registered successfully"))
}

/// Generic staff registration; the role comes from the body.
pub async fn add_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(staff): ApiJson<NewStaff>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state.desk.register_staff(&session.principal, staff)?;
    Ok(registered(user_id, "Staff member added successfully"))
}

fn registered(user_id: i64, message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "user_id": user_id }))
}

pub async fn patient_details(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<PatientDetails>, ApiError> {
    Ok(Json(state.desk.patient_details(&session.principal, patient_id)?))
}

pub async fn all_patients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    Ok(Json(state.desk.all_patients(&session.principal)?))
}

pub async fn appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    Ok(Json(state.desk.all_appointments(&session.principal)?))
}

pub async fn billing_overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<BillingView>>, ApiError> {
    Ok(Json(state.desk.billing_overview(&session.principal)?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.desk.delete_user(&session.principal, user_id)?;
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
        "removed": removed,
    })))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(update): ApiJson<StaffUpdate>,
) -> Result<Json<Value>, ApiError> {
    state.desk.update_user(&session.principal, user_id, update)?;
    Ok(success_message("User updated successfully"))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
    ApiJson(form): ApiJson<PatientForm>,
) -> Result<Json<Value>, ApiError> {
    state.desk.update_patient(&session.principal, patient_id, form)?;
    Ok(success_message("Patient updated successfully"))
}

pub async fn delete_consultation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(consultation_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.desk.delete_consultation(&session.principal, consultation_id)?;
    Ok(success_message("Consultation deleted successfully"))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.desk.delete_patient(&session.principal, patient_id)?;
    Ok(Json(json!({
        "success": true,
        "message": "Patient and all related records deleted successfully",
        "removed": removed,
    })))
}
