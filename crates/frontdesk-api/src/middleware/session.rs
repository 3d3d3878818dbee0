//! Session cookie authentication.
//!
//! Reads `Cookie: session=<token>`, resolves it against the service's
//! session store, and injects a [`Session`] into request extensions.
//! Role checks stay with the core policies; this layer only answers
//! "is there a live session at all".

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use frontdesk_core::Principal;

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller, injected by [`require_session`].
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub principal: Principal,
}

/// Extract the session token from the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Attach a `Set-Cookie` header to a response.
pub fn with_cookie(mut response: Response, cookie: HeaderValue) -> Response {
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}

/// Require a live session. Expects `AppState` as a request extension.
pub async fn require_session(req: Request<Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("missing application state".into()))?;

    let token = session_token(req.headers()).ok_or(ApiError::Unauthorized)?;
    let principal = state.desk.principal(&token).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "request without a live session");
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(Session { token, principal });
    Ok(next.run(req).await)
}
