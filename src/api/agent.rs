use crate::agent::{AgentResults, CampusAgent, EnergyData, SensorData};
use crate::api::error::AppError;
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared state for the agent API
#[derive(Clone)]
pub struct AgentAppState {
    pub agent: Arc<CampusAgent>,
}

/// Body of POST /api/ai-agent/process
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    sensor_data: Option<SensorData>,
    energy_data: Option<EnergyData>,
}

#[derive(Serialize)]
struct ProcessResponse {
    success: bool,
    data: AgentResults,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    is_processing: bool,
    last_results: Option<AgentResults>,
    timestamp: DateTime<Utc>,
}

pub fn create_agent_router(state: AgentAppState) -> Router {
    Router::new()
        .route("/api/ai-agent/process", post(process_campus_data))
        .route("/api/ai-agent/status", get(agent_status))
        .with_state(Arc::new(state))
}

/// POST /api/ai-agent/process - Run one analysis over the submitted snapshot
async fn process_campus_data(
    State(state): State<Arc<AgentAppState>>,
    body: Bytes,
) -> Result<Json<ProcessResponse>, AppError> {
    let request: ProcessRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))?;

    let (Some(sensor_data), Some(energy_data)) = (request.sensor_data, request.energy_data)
    else {
        return Err(AppError::ValidationError(
            "sensorData and energyData are required".to_string(),
        ));
    };

    let results = state
        .agent
        .process_campus_data(sensor_data, energy_data)
        .await?;

    info!(
        alerts = results.alerts.len(),
        processing_time_ms = results.processing_time,
        "Agent request served"
    );

    Ok(Json(ProcessResponse {
        success: true,
        data: results,
    }))
}

/// GET /api/ai-agent/status
async fn agent_status(State(state): State<Arc<AgentAppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        is_processing: state.agent.is_processing(),
        last_results: state.agent.last_results(),
        timestamp: Utc::now(),
    })
}
