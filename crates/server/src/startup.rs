use std::net::SocketAddr;
use std::time::Duration;

use common::utils::logging::{init_logging, LogFormat};
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

/// Load `.env` and the config file (falling back to the environment), then
/// install the tracing subscriber the config asks for.
pub fn load_config_and_logging() -> anyhow::Result<AppConfig> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(format!("{e:#}")))?;
    let format = cfg.logging.format.parse::<LogFormat>().unwrap_or_else(|e| {
        eprintln!("{e}; using compact logs");
        LogFormat::default()
    });
    init_logging(format);
    Ok(cfg)
}

/// Connect, migrate, and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Migration(e.to_string()))?;
        info!("migrations applied");
    }

    let state = ServerState::new(db, &cfg);
    if let Some(secs) = cfg.session.purge_interval_secs {
        state.services.sessions.clone().spawn_purge_task(Duration::from_secs(secs));
        info!(every_secs = secs, "session purge task started");
    }

    let app = routes::build_router(state);
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    info!(addr = %listener.local_addr()?, "bank server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
