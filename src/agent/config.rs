use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the campus agent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Artificial latency added to every analysis (milliseconds)
    #[serde(default = "default_processing_delay")]
    pub processing_delay_ms: u64,

    /// Equipment inventory checked for maintenance
    #[serde(default = "default_equipment")]
    pub equipment: Vec<Equipment>,
}

fn default_processing_delay() -> u64 {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: default_processing_delay(),
            equipment: default_equipment(),
        }
    }
}

impl AgentConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

/// A piece of campus equipment with a synthetic 0 to 100 health score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub building_id: String,
    pub health_score: u32,
}

impl Equipment {
    pub fn new(id: &str, equipment_type: &str, building_id: &str, health_score: u32) -> Self {
        Self {
            id: id.to_string(),
            equipment_type: equipment_type.to_string(),
            building_id: building_id.to_string(),
            health_score,
        }
    }
}

pub fn default_equipment() -> Vec<Equipment> {
    vec![
        Equipment::new("eq-001", "hvac", "bld-001", 75),
        Equipment::new("eq-002", "elevator", "bld-002", 45),
        Equipment::new("eq-003", "generator", "bld-003", 90),
    ]
}
