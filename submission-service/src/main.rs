use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use submission_service::{
    build_router,
    config::SubmissionConfig,
    db,
    services::{
        metrics::init_metrics, LocalBlobStore, PgRepository, RedisStore, SmtpEmailSender,
        SystemClock,
    },
    AppDeps, AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = SubmissionConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )
    .map_err(AppError::ConfigError)?;

    init_metrics().map_err(AppError::ConfigError)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting submission service"
    );

    let pool = db::connect(&config.database).await?;

    let store = RedisStore::new(&config.redis)
        .await
        .map_err(|e| AppError::ServiceUnavailable(format!("Redis: {}", e)))?;
    tracing::info!("Shared store connected");

    let blobs = LocalBlobStore::new(&config.upload.path).await?;
    let email = SmtpEmailSender::new(
        &config.smtp,
        Duration::from_secs(config.verification.code_ttl_seconds),
    )?;
    tracing::info!("Blob store and email sender initialized");

    let addr = config.common.socket_addr();
    let grace = Duration::from_secs(config.common.shutdown_grace_seconds);

    let state = AppState::new(
        config,
        AppDeps {
            store: Arc::new(store),
            repo: Arc::new(PgRepository::new(pool)),
            blobs: Arc::new(blobs),
            email: Arc::new(email),
            clock: Arc::new(SystemClock),
        },
    )?;
    let app = build_router(state)?;

    tracing::info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(grace))
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

    tokio::time::sleep(grace).await;
}
