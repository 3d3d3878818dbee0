use std::sync::Arc;

use anyhow::Context;
use frontdesk_api::config::{self, Config};
use frontdesk_core::{FrontDesk, PasswordHasher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    frontdesk_api::init_tracing(&config.log_filter);
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let desk = FrontDesk::open(&config.db_path, PasswordHasher::new(config.password_iterations))
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    let created = desk.ensure_admin(&config.admin.email, &config.admin.password, &config.admin.name)?;
    if created {
        tracing::warn!(email = %config.admin.email, "created bootstrap admin; change its password");
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, db = %config.db_path.display(), "listening");

    let app = frontdesk_api::router(Arc::new(desk));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}
