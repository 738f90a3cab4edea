use serde::{Deserialize, Serialize};

/// Configuration for the notification service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationServiceConfig {
    /// Maximum notifications kept (oldest dropped)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// SQLite file for persisted preferences; unset keeps them in memory
    #[serde(default)]
    pub settings_path: Option<String>,

    /// Inject canned notifications in the background
    #[serde(default = "default_simulation_enabled")]
    pub simulation_enabled: bool,

    #[serde(default = "default_simulation_interval")]
    pub simulation_interval_seconds: u64,

    /// Chance that a simulation tick injects a notification
    #[serde(default = "default_simulation_probability")]
    pub simulation_probability: f64,

    /// Fixed RNG seed (reproducible simulation)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_capacity() -> usize {
    100
}

fn default_simulation_enabled() -> bool {
    true
}

fn default_simulation_interval() -> u64 {
    15
}

fn default_simulation_probability() -> f64 {
    0.3
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            settings_path: None,
            simulation_enabled: default_simulation_enabled(),
            simulation_interval_seconds: default_simulation_interval(),
            simulation_probability: default_simulation_probability(),
            seed: None,
        }
    }
}
