use std::net::SocketAddr;
use std::sync::Arc;

use admin_service::{
    build_router,
    config::AdminConfig,
    db,
    services::{EmailService, PgCredentialStore},
    AppState,
};
use service_core::error::{expose_error_details, AppError};
use service_core::observability::{logging::shutdown_tracing, metrics::init_metrics, init_tracing};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AdminConfig::from_env()?;
    expose_error_details(!config.is_production());

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting admin service"
    );

    let pool = db::pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;

    if config.database.run_migrations {
        db::run_migrations(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    }

    let store = Arc::new(PgCredentialStore::new(pool.clone()));
    let email = Arc::new(EmailService::new(&config.email));
    tracing::info!("Email service initialized");

    let state = AppState::new(config.clone(), pool, store, email);

    if let Some(bootstrap) = &config.bootstrap {
        state.auth_service.bootstrap_super_admin(bootstrap).await?;
    }

    let app = build_router(state).await?;

    let listener = tokio::net::TcpListener::bind(config.common.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db::close().await;
    tracing::info!("Service shutdown complete");
    shutdown_tracing();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
