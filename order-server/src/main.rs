mod auth;
mod config;
mod error;
mod policy;
mod routes;
mod state;

use boost_pricing::PricingConfig;
use eyre::WrapErr;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Order server starting...");

    let config = config::Config::from_env().wrap_err("Failed to load order server config")?;

    std::fs::create_dir_all(&config.data_dir)
        .wrap_err_with(|| format!("failed to create data dir: {:?}", config.data_dir))?;

    let pricing = match &config.pricing_config_path {
        Some(path) => {
            tracing::info!("Loading pricing config from {}", path.display());
            PricingConfig::from_path(path)?
        }
        None => {
            tracing::info!("Using built-in pricing config");
            PricingConfig::default()
        }
    };

    let db_pool = boost_db::connect(&config.database_url)
        .await
        .wrap_err("Failed to connect to database")?;
    boost_db::migrate(&db_pool)
        .await
        .wrap_err("Failed to run migrations")?;
    tracing::info!("Database ready at {}", config.database_url);

    let app_state =
        state::AppState::new(db_pool, pricing).wrap_err("Invalid pricing configuration")?;

    let app = routes::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err("Failed to bind to address")?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("SIGTERM handler unavailable: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = tokio::signal::ctrl_c() => {},
    }
    tracing::info!("Shutting down");
}
