//! `/api/vitals/*` endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use frontdesk_core::models::{VitalsEntry, VitalsReading};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::session::Session;
use crate::AppState;

/// Receptionists and doctors record; the session user is the recorder.
pub async fn record(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
    ApiJson(reading): ApiJson<VitalsReading>,
) -> Result<Json<Value>, ApiError> {
    let vitals_id = state
        .desk
        .record_vitals(&session.principal, patient_id, reading)?;
    Ok(Json(json!({ "success": true, "vitals_id": vitals_id })))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Vec<VitalsEntry>>, ApiError> {
    Ok(Json(state.desk.vitals_history(&session.principal, patient_id)?))
}

/// `{vitals: <entry>}`, with `null` when nothing was recorded.
pub async fn latest(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let vitals = state.desk.latest_vitals(&session.principal, patient_id)?;
    Ok(Json(json!({ "vitals": vitals })))
}
