use super::Sensor;
use serde::{Deserialize, Serialize};

/// Configuration for the sensor simulator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Start generating readings when the server boots
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Readings retained per sensor (oldest evicted first)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Chance that a generated reading is flagged `poor`
    #[serde(default = "default_poor_quality_probability")]
    pub poor_quality_probability: f64,

    /// Fixed RNG seed (reproducible readings)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Simulated sensors; empty means the built-in catalog
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

fn default_enabled() -> bool {
    true
}

fn default_history_limit() -> usize {
    100
}

fn default_poor_quality_probability() -> f64 {
    0.05
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            history_limit: default_history_limit(),
            poor_quality_probability: default_poor_quality_probability(),
            seed: None,
            sensors: Vec::new(),
        }
    }
}

impl SimulatorConfig {
    /// Configured sensors, or the built-in catalog when none are listed.
    pub fn sensors_or_default(&self) -> Vec<Sensor> {
        if self.sensors.is_empty() {
            super::default_catalog()
        } else {
            self.sensors.clone()
        }
    }
}
