// Sensor model and reading simulator

pub mod config;
mod simulator;

#[cfg(test)]
mod tests;

pub use config::SimulatorConfig;
pub use simulator::{is_business_hours, SensorSimulator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of physical quantity a sensor measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Humidity,
    Occupancy,
    Energy,
    AirQuality,
    Light,
    Noise,
}

impl SensorType {
    pub const ALL: [SensorType; 7] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Occupancy,
        SensorType::Energy,
        SensorType::AirQuality,
        SensorType::Light,
        SensorType::Noise,
    ];

    /// Inclusive `(min, max)` range of simulated values.
    pub fn range(self) -> (f64, f64) {
        match self {
            SensorType::Temperature => (18.0, 26.0),
            SensorType::Humidity => (30.0, 70.0),
            SensorType::Occupancy => (0.0, 100.0),
            SensorType::Energy => (50.0, 500.0),
            SensorType::AirQuality => (0.0, 150.0),
            SensorType::Light => (0.0, 1000.0),
            SensorType::Noise => (30.0, 80.0),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Humidity => "%",
            SensorType::Occupancy => "people",
            SensorType::Energy => "kWh",
            SensorType::AirQuality => "AQI",
            SensorType::Light => "lux",
            SensorType::Noise => "dB",
        }
    }

    /// How often a sensor of this type produces a reading.
    pub fn interval(self) -> Duration {
        let secs = match self {
            SensorType::Occupancy => 10,
            SensorType::Noise => 15,
            SensorType::Light => 20,
            SensorType::Temperature | SensorType::Humidity | SensorType::AirQuality => 30,
            SensorType::Energy => 60,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Occupancy => "occupancy",
            SensorType::Energy => "energy",
            SensorType::AirQuality => "air_quality",
            SensorType::Light => "light",
            SensorType::Noise => "noise",
        };
        f.write_str(name)
    }
}

/// A simulated campus sensor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub building_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Sensor {
    pub fn new(id: &str, name: &str, sensor_type: SensorType, building_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sensor_type,
            building_id: building_id.to_string(),
            location: None,
        }
    }
}

/// Signal quality attached to a reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingQuality {
    Good,
    Fair,
    Poor,
    Error,
}

/// One sample produced by a sensor
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: String,
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    pub quality: ReadingQuality,
}

/// Built-in sensor inventory used when the configuration lists none.
pub fn default_catalog() -> Vec<Sensor> {
    vec![
        Sensor::new("sensor-001", "Main Hall Temperature", SensorType::Temperature, "bld-001"),
        Sensor::new("sensor-002", "Main Hall Humidity", SensorType::Humidity, "bld-001"),
        Sensor::new("sensor-003", "Main Hall Energy Meter", SensorType::Energy, "bld-001"),
        Sensor::new("sensor-004", "Library Occupancy", SensorType::Occupancy, "bld-002"),
        Sensor::new("sensor-005", "Library Air Quality", SensorType::AirQuality, "bld-002"),
        Sensor::new("sensor-006", "Library Light Level", SensorType::Light, "bld-002"),
        Sensor::new("sensor-007", "Lab Energy Meter", SensorType::Energy, "bld-003"),
        Sensor::new("sensor-008", "Lab Noise Level", SensorType::Noise, "bld-003"),
    ]
}
