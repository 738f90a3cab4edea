use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

// Re-export per-service config types
pub use crate::agent::config::AgentConfig;
pub use crate::notification::config::NotificationServiceConfig;
pub use crate::sensor::config::SimulatorConfig;

/// Complete campus service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CampusConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub notifications: NotificationServiceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            simulator: SimulatorConfig::default(),
            notifications: NotificationServiceConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl CampusConfig {
    /// Apply environment overrides on top of file/default values.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CAMPUS_BIND_ADDRESS") {
            if !v.is_empty() {
                self.server.bind_address = v;
            }
        }
        if let Ok(v) = std::env::var("CAMPUS_AGENT_DELAY_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                self.agent.processing_delay_ms = ms;
            }
        }
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        check_probability(
            "simulator.poor_quality_probability",
            self.simulator.poor_quality_probability,
        )?;
        check_probability(
            "notifications.simulation_probability",
            self.notifications.simulation_probability,
        )?;
        ensure!(
            self.simulator.history_limit >= 1,
            "simulator.history_limit must be at least 1"
        );
        ensure!(
            self.notifications.capacity >= 1,
            "notifications.capacity must be at least 1"
        );
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && (0.0..=1.0).contains(&value),
        "{} must be between 0 and 1, got {}",
        name,
        value
    );
    Ok(())
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<CampusConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: CampusConfig =
        toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path))?;
    Ok(config)
}

/// Load `path` if it exists, otherwise defaults; env overrides applied either way.
pub fn load_or_default(path: &str) -> Result<CampusConfig> {
    let mut config = if Path::new(path).exists() {
        info!(path = %path, "Loading configuration");
        load_config(path)?
    } else {
        info!(path = %path, "No config file, using defaults");
        CampusConfig::default()
    };
    config.apply_env();
    Ok(config)
}
