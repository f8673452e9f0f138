use std::{future::Future, net::SocketAddr};

use axum::Router;
use chrono::Duration;
use configs::{AppConfig, DEV_JWT_SECRET};
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Translate the `[auth]` config section into the auth service settings.
pub fn auth_config(cfg: &configs::AuthConfig) -> service::AuthConfig {
    let mut auth = service::AuthConfig::new(cfg.jwt_secret.clone());
    auth.token_ttl = Duration::hours(cfg.token_ttl_hours);
    auth.admin_email = cfg.admin_email.clone();
    auth
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", cfg.server.host, cfg.server.port)))
}

/// Build the app against an already connected database.
pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: connect, migrate and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    run_until(cfg, shutdown_signal()).await
}

pub async fn run_until(cfg: AppConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    if cfg.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("using the development JWT secret; set JWT_SECRET in production");
    }
    let addr = bind_addr(&cfg)?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("database migrations applied");

    let state = ServerState { db, auth: auth_config(&cfg.auth) };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server stopped");
    Ok(())
}
