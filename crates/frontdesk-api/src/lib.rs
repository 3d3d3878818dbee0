//! HTTP surface for the front desk.
//!
//! Routes live under `/api/`. Everything except login and logout sits
//! behind the session cookie middleware; role checks happen in the
//! `frontdesk_core::FrontDesk` facade that each handler calls.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use frontdesk_core::FrontDesk;
use tracing_subscriber::EnvFilter;

/// Shared state for handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<FrontDesk>,
}

impl AppState {
    pub fn new(desk: Arc<FrontDesk>) -> Self {
        Self { desk }
    }
}

/// Build the API router around a front desk service.
pub fn router(desk: Arc<FrontDesk>) -> Router {
    routes::build_router(AppState::new(desk))
}

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
