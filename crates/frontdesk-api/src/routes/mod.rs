//! Route table and small request/response helpers shared by handlers.
//!
//! Layer order on protected routes (outermost first):
//! `Extension(AppState)` → `require_session` → handler.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod receptionist;
pub mod vitals;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use frontdesk_core::models::today;
use frontdesk_core::DateRange;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/change-password", post(auth::change_password))
        // Admin
        .route("/admin/dashboard-summary", get(admin::dashboard_summary))
        .route("/admin/hospital-overview", get(admin::hospital_overview))
        .route("/admin/all-staff", get(admin::all_staff))
        .route("/admin/register-doctor", post(admin::register_doctor))
        .route("/admin/register-receptionist", post(admin::register_receptionist))
        .route("/admin/add-staff", post(admin::add_staff))
        .route("/admin/patient-details/:id", get(admin::patient_details))
        .route("/admin/all-patients", get(admin::all_patients))
        .route("/admin/appointments", get(admin::appointments))
        .route("/admin/all-appointments", get(admin::appointments))
        .route("/admin/billing-overview", get(admin::billing_overview))
        .route("/admin/delete-user/:id", delete(admin::delete_user))
        .route("/admin/update-user/:id", put(admin::update_user))
        .route("/admin/update-patient/:id", put(admin::update_patient))
        .route("/admin/delete-consultation/:id", delete(admin::delete_consultation))
        .route("/admin/delete-patient/:id", delete(admin::delete_patient))
        // Receptionist
        .route("/receptionist/dashboard-summary", get(receptionist::dashboard_summary))
        .route("/receptionist/dashboard", get(receptionist::quick_dashboard))
        .route("/receptionist/register-patient", post(receptionist::register_patient))
        .route("/receptionist/create-appointment", post(receptionist::create_appointment))
        .route("/receptionist/patients", get(receptionist::patients))
        .route("/receptionist/billing", get(receptionist::billing))
        .route("/receptionist/all-billing", get(receptionist::billing))
        .route("/receptionist/mark-paid/:id", post(receptionist::mark_paid))
        .route("/receptionist/doctors/:department", get(receptionist::doctors))
        .route("/receptionist/appointments", get(receptionist::appointments))
        .route("/receptionist/queue", get(receptionist::queue))
        .route("/receptionist/add-to-queue", post(receptionist::add_to_queue))
        .route(
            "/receptionist/queue-appointment/:id",
            post(receptionist::queue_appointment),
        )
        .route("/receptionist/patient-names", get(receptionist::patient_names))
        .route("/receptionist/doctor-names", get(receptionist::doctor_names))
        .route(
            "/receptionist/patient-details/:id",
            get(receptionist::patient_details),
        )
        .route(
            "/receptionist/remove-from-queue/:id",
            delete(receptionist::remove_from_queue),
        )
        .route(
            "/receptionist/cancel-appointment/:id",
            delete(receptionist::cancel_appointment),
        )
        // Doctor
        .route("/doctor/dashboard", get(doctor::dashboard))
        .route("/doctor/start-consultation/:id", post(doctor::start_consultation))
        .route("/doctor/save-consultation", post(doctor::save_consultation))
        .route("/doctor/patient-history/:id", get(doctor::patient_history))
        .route("/doctor/my-patients", get(doctor::my_patients))
        .route("/doctor/queue", get(doctor::queue))
        .route("/doctor/appointments", get(doctor::appointments))
        .route("/doctor/patient-details/:id", get(doctor::patient_details))
        .route("/doctor/update-consultation/:id", put(doctor::update_consultation))
        .route("/doctor/doctor-info", get(doctor::doctor_info))
        .route("/doctor/change-password", post(doctor::change_password))
        // Vitals
        .route("/vitals/record/:id", post(vitals::record))
        .route("/vitals/patient/:id", get(vitals::history))
        .route("/vitals/latest/:id", get(vitals::latest))
        .with_state(state.clone())
        .layer(axum::middleware::from_fn(middleware::session::require_session))
        .layer(axum::Extension(state.clone()));

    let public = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .with_state(state);

    Router::new().nest("/api", protected).nest("/api", public)
}

/// `?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`, both optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange::from_params(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today(),
        )?)
    }
}

pub(crate) fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub(crate) fn success_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}
