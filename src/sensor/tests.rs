use super::*;
use crate::clock::{Clock, ManualClock};
use chrono::NaiveTime;
use std::sync::Arc;

fn seeded_config(seed: u64) -> SimulatorConfig {
    SimulatorConfig {
        seed: Some(seed),
        ..SimulatorConfig::default()
    }
}

fn simulator_at(hour: u32, seed: u64) -> SensorSimulator {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(hour, 0));
    SensorSimulator::new(seeded_config(seed), clock)
}

fn reading_for(sensor_id: &str, value: f64) -> SensorReading {
    SensorReading {
        id: format!("{}-{}", sensor_id, value),
        sensor_id: sensor_id.to_string(),
        timestamp: chrono::Utc::now(),
        value,
        unit: "°C".to_string(),
        quality: ReadingQuality::Good,
    }
}

#[test]
fn test_generated_values_stay_in_range() {
    for hour in [3, 12, 20] {
        let simulator = simulator_at(hour, 7);

        for sensor_type in SensorType::ALL {
            let sensor = Sensor::new("s", "s", sensor_type, "bld-001");
            let (min, max) = sensor_type.range();

            for _ in 0..500 {
                let reading = simulator.generate_reading(&sensor);
                assert!(
                    reading.value >= min && reading.value <= max,
                    "{} value {} outside [{}, {}] at {}:00",
                    sensor_type,
                    reading.value,
                    min,
                    max,
                    hour
                );
                assert_eq!(reading.unit, sensor_type.unit());
                assert_eq!(reading.sensor_id, "s");
            }
        }
    }
}

#[test]
fn test_poor_quality_rate_near_five_percent() {
    let simulator = simulator_at(12, 42);
    let sensor = Sensor::new("sensor-001", "t", SensorType::Temperature, "bld-001");

    let draws = 20_000;
    let poor = (0..draws)
        .map(|_| simulator.generate_reading(&sensor))
        .filter(|r| r.quality == ReadingQuality::Poor)
        .count();

    let rate = poor as f64 / draws as f64;
    assert!(rate > 0.035 && rate < 0.065, "poor rate was {}", rate);
}

#[test]
fn test_quality_is_good_or_poor_only() {
    let simulator = simulator_at(12, 1);
    let sensor = Sensor::new("sensor-001", "t", SensorType::Humidity, "bld-001");

    for _ in 0..1000 {
        let quality = simulator.generate_reading(&sensor).quality;
        assert!(quality == ReadingQuality::Good || quality == ReadingQuality::Poor);
    }
}

#[test]
fn test_occupancy_low_outside_business_hours() {
    let simulator = simulator_at(2, 9);
    let sensor = Sensor::new("occ", "o", SensorType::Occupancy, "bld-002");

    for _ in 0..500 {
        let value = simulator.generate_reading(&sensor).value;
        assert!(value <= 20.0, "night occupancy {} too high", value);
        assert_eq!(value, value.round());
    }
}

#[test]
fn test_energy_biased_by_business_hours() {
    let day = simulator_at(10, 3);
    let night = simulator_at(22, 3);
    let sensor = Sensor::new("meter", "m", SensorType::Energy, "bld-001");

    for _ in 0..500 {
        assert!(day.generate_reading(&sensor).value >= 230.0);
        assert!(night.generate_reading(&sensor).value <= 320.0);
    }
}

#[test]
fn test_business_hours_boundaries() {
    let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

    assert!(!is_business_hours(at(7, 59)));
    assert!(is_business_hours(at(8, 0)));
    assert!(is_business_hours(at(17, 59)));
    assert!(!is_business_hours(at(18, 0)));
}

#[test]
fn test_buffer_capped_at_history_limit() {
    let simulator = simulator_at(12, 5);

    for i in 0..100 {
        simulator.record_reading(reading_for("sensor-001", i as f64));
    }
    assert_eq!(simulator.readings("sensor-001").len(), 100);
    assert_eq!(simulator.readings("sensor-001")[0].value, 0.0);

    // 101st push evicts the oldest
    simulator.record_reading(reading_for("sensor-001", 100.0));
    let readings = simulator.readings("sensor-001");
    assert_eq!(readings.len(), 100);
    assert_eq!(readings[0].value, 1.0);
    assert_eq!(readings[99].value, 100.0);
}

#[test]
fn test_latest_reading_queries() {
    let simulator = simulator_at(12, 5);

    assert!(simulator.latest_reading("sensor-001").is_none());
    assert!(simulator.readings("sensor-001").is_empty());

    simulator.record_reading(reading_for("sensor-002", 1.0));
    simulator.record_reading(reading_for("sensor-001", 2.0));
    simulator.record_reading(reading_for("sensor-001", 3.0));

    assert_eq!(simulator.latest_reading("sensor-001").unwrap().value, 3.0);

    let latest = simulator.latest_readings();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].sensor_id, "sensor-001");
    assert_eq!(latest[0].value, 3.0);
    assert_eq!(latest[1].sensor_id, "sensor-002");
}

#[test]
fn test_recorded_readings_are_broadcast() {
    let simulator = simulator_at(12, 5);
    let mut rx = simulator.subscribe();

    simulator.record_reading(reading_for("sensor-001", 21.5));

    let reading = rx.try_recv().unwrap();
    assert_eq!(reading.sensor_id, "sensor-001");
    assert_eq!(reading.value, 21.5);
}

#[test]
fn test_reading_serialization_uses_wire_names() {
    let json = serde_json::to_value(reading_for("sensor-001", 21.5)).unwrap();
    assert_eq!(json["sensorId"], "sensor-001");
    assert_eq!(json["quality"], "good");

    let sensor = Sensor::new("sensor-005", "aq", SensorType::AirQuality, "bld-002");
    let json = serde_json::to_value(&sensor).unwrap();
    assert_eq!(json["type"], "air_quality");
    assert_eq!(json["buildingId"], "bld-002");
}

#[tokio::test(start_paused = true)]
async fn test_start_generates_on_type_interval() {
    let simulator = Arc::new(simulator_at(12, 11));
    let occupancy = Sensor::new("occ", "o", SensorType::Occupancy, "bld-002");
    let energy = Sensor::new("meter", "m", SensorType::Energy, "bld-001");

    simulator.start(vec![occupancy, energy]);
    assert!(simulator.is_running());

    tokio::time::sleep(std::time::Duration::from_secs(35)).await;

    // Occupancy ticks at 0, 10, 20, 30s; energy only at 0s
    assert_eq!(simulator.readings("occ").len(), 4);
    assert_eq!(simulator.readings("meter").len(), 1);

    simulator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_generation_and_is_idempotent() {
    let simulator = Arc::new(simulator_at(12, 11));
    simulator.start(vec![Sensor::new("occ", "o", SensorType::Occupancy, "bld-002")]);

    tokio::time::sleep(std::time::Duration::from_secs(15)).await;
    simulator.stop();
    assert!(!simulator.is_running());
    let count = simulator.readings("occ").len();

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(simulator.readings("occ").len(), count);

    simulator.stop();
    assert!(!simulator.is_running());
}

#[test]
fn test_default_catalog_used_when_unconfigured() {
    let config = SimulatorConfig::default();
    assert_eq!(config.sensors_or_default(), default_catalog());

    let config = SimulatorConfig {
        sensors: vec![Sensor::new("x", "x", SensorType::Light, "bld-009")],
        ..SimulatorConfig::default()
    };
    assert_eq!(config.sensors_or_default().len(), 1);
}
