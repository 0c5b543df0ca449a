/**
 * API REST - lecture des capteurs par l'hôte
 *
 * ROLE: read-only view of every sensor's last snapshot. The host polls these
 * routes on its own schedule; nothing is pushed.
 *
 * ROUTES:
 * - GET /health          liveness, always accessible
 * - GET /system/health   uptime and poll counters
 * - GET /sensors         every sensor
 * - GET /sensors/{name}  one sensor, 404 if unknown
 *
 * SECURITY: when JSONAPI_SENSOR_API_KEY is set, every route except /health*
 * requires a matching `x-api-key` header.
 */

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::health::{HealthTracker, RuntimeHealth};
use crate::registry::SensorRegistry;
use crate::sensor::JsonApiSensor;

pub const API_KEY_ENV: &str = "JSONAPI_SENSOR_API_KEY";

#[derive(Clone)]
pub struct AppState {
    pub sensors: SensorRegistry,
    pub health_tracker: HealthTracker,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(sensors: SensorRegistry, health_tracker: HealthTracker) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self {
            sensors,
            health_tracker,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SensorView {
    name: String,
    state: Value,
    attributes: Map<String, Value>,
    available: bool,
    last_updated: Option<String>,
    scan_interval_seconds: u64,
}

fn to_view(sensor: &JsonApiSensor) -> SensorView {
    let snapshot = sensor.state();
    SensorView {
        name: sensor.name().to_string(),
        state: snapshot.primary,
        attributes: snapshot.attributes,
        available: snapshot.available,
        last_updated: snapshot
            .last_updated
            .and_then(|ts| ts.format(&Rfc3339).ok()),
        scan_interval_seconds: sensor.config().scan_interval.as_secs(),
    }
}

async fn require_api_key(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = app.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        warn!(path = %req.uri().path(), "rejected request without valid API key");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/sensors", get(get_sensors))
        .route("/sensors/{name}", get(get_sensor))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

// GET /sensors
async fn get_sensors(State(app): State<AppState>) -> Json<Vec<SensorView>> {
    Json(app.sensors.iter().map(|s| to_view(s)).collect())
}

// GET /sensors/{name}
async fn get_sensor(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SensorView>, StatusCode> {
    let Some(sensor) = app.sensors.get(&name) else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(to_view(sensor)))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<RuntimeHealth> {
    Json(app.health_tracker.get_health(&app.sensors))
}
