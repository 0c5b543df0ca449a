/**
 * JSONAPI SENSOR - point d'entrée du runtime
 *
 * ROLE: loads the sensor configuration, builds the shared HTTP client, starts
 * one poller per sensor and serves the read API.
 */

use anyhow::{Context, Result};
use jsonapi_sensor::config::{config_path, RuntimeConfig};
use jsonapi_sensor::health::HealthTracker;
use jsonapi_sensor::http::{build_router, AppState};
use jsonapi_sensor::{JinjaRenderer, SensorRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jsonapi_sensor=info")),
        )
        .init();

    let path = config_path();
    let config = RuntimeConfig::load(&path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;

    // Un seul client partagé par tous les capteurs
    let client = reqwest::Client::builder()
        .user_agent(concat!("jsonapi-sensor/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let sensors = SensorRegistry::from_config(&config, client, Arc::new(JinjaRenderer::new()));
    let health_tracker = HealthTracker::new();
    let _pollers = sensors.spawn_pollers(&health_tracker);

    let app = build_router(AppState::new(sensors, health_tracker));
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, "read API listening");

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
