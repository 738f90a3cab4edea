use crate::api::error::AppError;
use crate::sensor::{Sensor, SensorReading, SensorSimulator};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the sensor API
#[derive(Clone)]
pub struct SensorAppState {
    pub simulator: Arc<SensorSimulator>,
    /// Sensors the simulator was started with
    pub sensors: Arc<Vec<Sensor>>,
}

#[derive(Serialize)]
struct SensorSummary {
    #[serde(flatten)]
    sensor: Sensor,
    latest: Option<SensorReading>,
}

#[derive(Serialize)]
struct SensorListResponse {
    running: bool,
    sensors: Vec<SensorSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingsResponse {
    sensor_id: String,
    readings: Vec<SensorReading>,
}

pub fn create_sensor_router(state: SensorAppState) -> Router {
    Router::new()
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/:id/readings", get(get_readings))
        .route("/api/sensors/:id/latest", get(get_latest))
        .with_state(Arc::new(state))
}

/// GET /api/sensors - Inventory with each sensor's latest reading
async fn list_sensors(State(state): State<Arc<SensorAppState>>) -> Json<SensorListResponse> {
    let sensors = state
        .sensors
        .iter()
        .map(|sensor| SensorSummary {
            latest: state.simulator.latest_reading(&sensor.id),
            sensor: sensor.clone(),
        })
        .collect();

    Json(SensorListResponse {
        running: state.simulator.is_running(),
        sensors,
    })
}

/// GET /api/sensors/:id/readings - Buffered history, oldest first
async fn get_readings(
    State(state): State<Arc<SensorAppState>>,
    Path(sensor_id): Path<String>,
) -> Result<Json<ReadingsResponse>, AppError> {
    if !state.sensors.iter().any(|s| s.id == sensor_id) {
        return Err(AppError::NotFound(format!("Unknown sensor {}", sensor_id)));
    }

    Ok(Json(ReadingsResponse {
        readings: state.simulator.readings(&sensor_id),
        sensor_id,
    }))
}

/// GET /api/sensors/:id/latest
async fn get_latest(
    State(state): State<Arc<SensorAppState>>,
    Path(sensor_id): Path<String>,
) -> Result<Json<SensorReading>, AppError> {
    state
        .simulator
        .latest_reading(&sensor_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No readings for sensor {}", sensor_id)))
}
