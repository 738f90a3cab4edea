// Campus analysis agent: threshold checks over a sensor/energy snapshot

mod analysis;
pub mod config;
mod service;

#[cfg(test)]
mod tests;

pub use analysis::{analyze, days_to_failure, threshold_for};
pub use config::{default_equipment, AgentConfig, Equipment};
pub use service::{AgentError, CampusAgent};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sensor snapshot keyed by sensor id
pub type SensorData = BTreeMap<String, SensorSample>;

/// Energy snapshot keyed by building id
pub type EnergyData = BTreeMap<String, EnergyRecord>;

/// One sensor's current value as submitted for analysis.
///
/// `type` is free-form; types without a threshold never raise alerts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
}

/// A building's energy figures as submitted for analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnergyRecord {
    #[serde(default = "default_consumption")]
    pub current_consumption: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
}

fn default_consumption() -> f64 {
    1000.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Environmental,
    Energy,
    Maintenance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Sensor,
    Equipment,
}

/// What raised an alert
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub source: AlertSource,
    pub building_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
    pub actions: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Energy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub building_id: String,
    pub impact: Impact,
    /// Estimated cost savings in dollars
    pub estimated_savings: f64,
    pub actions: Vec<String>,
    /// 1 (lowest) to 10
    pub priority: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePrediction {
    pub equipment_id: String,
    pub equipment_type: String,
    pub building_id: String,
    pub health_score: u32,
    pub days_to_failure: u32,
    pub predicted_failure_date: DateTime<Utc>,
    pub confidence: f64,
    pub recommended_action: String,
    pub priority: Priority,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPrediction {
    pub building_id: String,
    pub date: NaiveDate,
    pub current_consumption: f64,
    pub predicted_consumption: f64,
    pub confidence: f64,
}

/// Follow-up decision derived from the generated alerts and recommendations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    AutoApproved {
        recommendation_id: String,
        reason: String,
    },
    HumanReviewRequired {
        reason: String,
        alert_ids: Vec<String>,
    },
}

/// Equipment ids grouped by how soon maintenance is due
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    pub immediate: Vec<String>,
    pub this_week: Vec<String>,
    pub this_month: Vec<String>,
    pub next_quarter: Vec<String>,
}

/// Summary counts for one analysis run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentContext {
    pub sensors_analyzed: usize,
    pub buildings_analyzed: usize,
    pub anomalies_detected: usize,
    pub alerts_generated: usize,
    pub critical_alerts: usize,
    pub recommendations_generated: usize,
    pub maintenance_predictions: usize,
    pub energy_predictions: usize,
    pub decisions: Vec<Decision>,
    pub maintenance_schedule: MaintenanceSchedule,
}

/// Output of one `process_campus_data` call; never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentResults {
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<Recommendation>,
    pub maintenance_predictions: Vec<MaintenancePrediction>,
    pub energy_predictions: Vec<EnergyPrediction>,
    pub context: AgentContext,
    pub timestamp: DateTime<Utc>,
    /// Wall time of the call in milliseconds, including the artificial delay
    pub processing_time: u64,
}
