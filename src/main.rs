use anyhow::{Context, Result};
use campus::agent::CampusAgent;
use campus::api::{
    create_agent_router, create_notification_router, create_sensor_router, create_ws_router,
    AgentAppState, NotificationAppState, SensorAppState, WsAppState,
};
use campus::clock::{Clock, SystemClock};
use campus::config::load_or_default;
use campus::notification::{
    MemorySettingsStore, NotificationService, SettingsStore, SqliteSettingsStore, TracingSink,
};
use campus::sensor::SensorSimulator;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus=info".into()),
        )
        .init();

    info!("Campus service starting...");

    let config_path =
        std::env::var("CAMPUS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = load_or_default(&config_path)?;

    info!(
        bind_address = %config.server.bind_address,
        simulator_enabled = config.simulator.enabled,
        notification_simulation = config.notifications.simulation_enabled,
        agent_delay_ms = config.agent.processing_delay_ms,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Sensor simulator
    let sensors = config.simulator.sensors_or_default();
    let simulator = Arc::new(SensorSimulator::new(config.simulator.clone(), clock.clone()));
    if config.simulator.enabled {
        simulator.start(sensors.clone());
    }

    // Notification service
    let store: Arc<dyn SettingsStore> = match &config.notifications.settings_path {
        Some(path) => Arc::new(
            SqliteSettingsStore::new(path).context("Failed to initialize settings store")?,
        ),
        None => Arc::new(MemorySettingsStore::new()),
    };
    let notifications = Arc::new(NotificationService::new(
        config.notifications.clone(),
        store,
        Arc::new(TracingSink),
        clock.clone(),
    ));
    if config.notifications.simulation_enabled {
        notifications.start_simulation();
    }

    let agent = Arc::new(CampusAgent::new(config.agent.clone(), clock));

    let app = create_agent_router(AgentAppState {
        agent: agent.clone(),
    })
    .merge(create_notification_router(NotificationAppState {
        service: notifications.clone(),
    }))
    .merge(create_sensor_router(SensorAppState {
        simulator: simulator.clone(),
        sensors: Arc::new(sensors),
    }))
    .merge(create_ws_router(WsAppState {
        notifications: notifications.clone(),
        simulator: simulator.clone(),
    }))
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "HTTP API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    simulator.stop();
    notifications.stop_simulation();
    info!("Campus service stopped");

    Ok(())
}
