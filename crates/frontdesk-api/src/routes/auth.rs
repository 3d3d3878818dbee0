//! Login, logout and password change.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use frontdesk_core::FrontDeskError;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::session::{
    expired_session_cookie, session_cookie, session_token, with_cookie, Session,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/login`: `{success, user}` plus the session cookie.
pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Response {
    match state.desk.login(&req.email, &req.password) {
        Ok(outcome) => {
            let Some(cookie) = session_cookie(&outcome.token) else {
                state.desk.logout(&outcome.token);
                return ApiError::Internal("unencodable session token".into()).into_response();
            };
            let body = Json(json!({ "success": true, "user": outcome.user }));
            with_cookie(body.into_response(), cookie)
        }
        Err(FrontDeskError::Authentication(message)) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `POST /api/logout`: always succeeds and clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.desk.logout(&token);
    }
    with_cookie(
        Json(json!({ "success": true })).into_response(),
        expired_session_cookie(),
    )
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/change-password`, open to every role.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    change_password_for(&state, &session, &req)
}

pub(crate) fn change_password_for(
    state: &AppState,
    session: &Session,
    req: &ChangePasswordRequest,
) -> Result<Response, ApiError> {
    let changed = state
        .desk
        .change_password(&session.principal, &req.current_password, &req.new_password)?;
    if changed {
        Ok(Json(json!({ "success": true })).into_response())
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Current password incorrect" })),
        )
            .into_response())
    }
}
