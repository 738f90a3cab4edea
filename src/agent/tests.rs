use super::*;
use crate::clock::{Clock, ManualClock};
use chrono::Utc;
use std::sync::Arc;

fn sample(sensor_type: &str, value: f64) -> SensorSample {
    SensorSample {
        sensor_type: sensor_type.to_string(),
        value,
        unit: None,
        building_id: Some("bld-001".to_string()),
    }
}

fn sensors(entries: &[(&str, &str, f64)]) -> SensorData {
    entries
        .iter()
        .map(|(id, t, v)| (id.to_string(), sample(t, *v)))
        .collect()
}

fn energy(entries: &[(&str, f64)]) -> EnergyData {
    entries
        .iter()
        .map(|(id, c)| {
            (
                id.to_string(),
                EnergyRecord {
                    current_consumption: *c,
                    baseline: Some(1200.0),
                },
            )
        })
        .collect()
}

fn agent() -> Arc<CampusAgent> {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(12, 0));
    Arc::new(CampusAgent::new(AgentConfig::default(), clock))
}

fn environmental(results: &AgentResults) -> Vec<&Alert> {
    results
        .alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::Environmental)
        .collect()
}

#[test]
fn test_temperature_anomaly_raises_one_alert() {
    let results = analyze(
        &sensors(&[("sensor-001", "temperature", 35.0)]),
        &EnergyData::new(),
        &[],
        Utc::now(),
    );

    let alerts = environmental(&results);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].source.id, "sensor-001");
    assert_eq!(alerts[0].source.source_type, SourceType::Sensor);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    assert_eq!(alerts[0].building_id.as_deref(), Some("bld-001"));
    assert!(!alerts[0].acknowledged);
    assert!(!alerts[0].resolved);
    assert_eq!(results.context.anomalies_detected, 1);
}

#[test]
fn test_normal_temperature_raises_nothing() {
    let results = analyze(
        &sensors(&[("sensor-001", "temperature", 22.0)]),
        &EnergyData::new(),
        &[],
        Utc::now(),
    );
    assert!(environmental(&results).is_empty());
}

#[test]
fn test_thresholds_are_strict() {
    let results = analyze(
        &sensors(&[
            ("t-low", "temperature", 15.0),
            ("t-high", "temperature", 30.0),
            ("h-low", "humidity", 19.9),
            ("h-high", "humidity", 80.1),
            ("e", "energy", 2500.5),
            ("aq", "air_quality", 300.0),
            ("aq-bad", "air_quality", 301.0),
        ]),
        &EnergyData::new(),
        &[],
        Utc::now(),
    );

    let mut flagged: Vec<&str> = environmental(&results)
        .iter()
        .map(|a| a.source.id.as_str())
        .collect();
    flagged.sort();
    assert_eq!(flagged, vec!["aq-bad", "e", "h-high", "h-low"]);
}

#[test]
fn test_unknown_sensor_type_never_triggers() {
    let results = analyze(
        &sensors(&[("s", "vibration", 1e9), ("o", "occupancy", -5.0)]),
        &EnergyData::new(),
        &[],
        Utc::now(),
    );
    assert!(environmental(&results).is_empty());
    assert_eq!(threshold_for("vibration"), None);
}

#[test]
fn test_high_consumption_yields_recommendation_and_prediction() {
    let now = Utc::now();
    let results = analyze(
        &SensorData::new(),
        &energy(&[("bld-001", 1500.0)]),
        &[],
        now,
    );

    assert_eq!(results.recommendations.len(), 1);
    let rec = &results.recommendations[0];
    assert_eq!(rec.recommendation_type, RecommendationType::Energy);
    assert_eq!(rec.building_id, "bld-001");
    assert!((rec.estimated_savings - 33.75).abs() < 1e-9);
    assert_eq!(rec.priority, 8);
    assert_eq!(rec.actions.len(), 3);

    assert_eq!(results.energy_predictions.len(), 1);
    let prediction = &results.energy_predictions[0];
    assert!((prediction.predicted_consumption - 1425.0).abs() < 1e-9);
    assert_eq!(prediction.confidence, 0.82);
    assert_eq!(prediction.date, (now + chrono::Duration::days(1)).date_naive());
}

#[test]
fn test_consumption_at_threshold_is_ignored() {
    let results = analyze(
        &SensorData::new(),
        &energy(&[("bld-001", 1200.0), ("bld-002", 980.0)]),
        &[],
        Utc::now(),
    );
    assert!(results.recommendations.is_empty());
    assert!(results.energy_predictions.is_empty());
    assert_eq!(results.context.buildings_analyzed, 2);
}

#[test]
fn test_missing_consumption_defaults_below_threshold() {
    let data: EnergyData = serde_json::from_str(r#"{"bld-001": {"baseline": 1200}}"#).unwrap();
    assert_eq!(data["bld-001"].current_consumption, 1000.0);

    let results = analyze(&SensorData::new(), &data, &[], Utc::now());
    assert!(results.recommendations.is_empty());
}

#[test]
fn test_days_to_failure_formula() {
    assert_eq!(days_to_failure(45), 5);
    assert_eq!(days_to_failure(59), 7);
    assert_eq!(days_to_failure(58), 7);
    assert_eq!(days_to_failure(24), 1);
    assert_eq!(days_to_failure(10), 1);
    assert_eq!(days_to_failure(0), 1);
}

#[test]
fn test_default_equipment_predictions() {
    let results = analyze(&SensorData::new(), &EnergyData::new(), &default_equipment(), Utc::now());

    // Only eq-002 (health 45) is below 60
    assert_eq!(results.maintenance_predictions.len(), 1);
    let prediction = &results.maintenance_predictions[0];
    assert_eq!(prediction.equipment_id, "eq-002");
    assert_eq!(prediction.days_to_failure, 5);
    assert_eq!(prediction.priority, Priority::High);
    assert_eq!(prediction.confidence, 0.85);

    let maintenance: Vec<&Alert> = results
        .alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::Maintenance)
        .collect();
    assert_eq!(maintenance.len(), 1);
    assert_eq!(maintenance[0].severity, AlertSeverity::Critical);
    assert_eq!(maintenance[0].source.id, "eq-002");

    // Critical item is scheduled immediately, not by its 5-day count
    let schedule = &results.context.maintenance_schedule;
    assert_eq!(schedule.immediate, vec!["eq-002"]);
    assert!(schedule.this_week.is_empty());
}

#[test]
fn test_health_threshold_boundary() {
    // Anything under 60 fails within 7 days, so every prediction is urgent
    let equipment = vec![Equipment::new("eq-9", "pump", "bld-004", 59)];
    let results = analyze(&SensorData::new(), &EnergyData::new(), &equipment, Utc::now());
    assert_eq!(results.maintenance_predictions[0].days_to_failure, 7);
    assert_eq!(results.maintenance_predictions[0].priority, Priority::High);
    assert_eq!(results.alerts[0].severity, AlertSeverity::Critical);

    let equipment = vec![Equipment::new("eq-9", "pump", "bld-004", 60)];
    let results = analyze(&SensorData::new(), &EnergyData::new(), &equipment, Utc::now());
    assert!(results.maintenance_predictions.is_empty());
    assert!(results.alerts.is_empty());
}

#[test]
fn test_equipment_inventory_from_config() {
    let config: AgentConfig = toml::from_str(
        r#"
            processing_delay_ms = 10

            [[equipment]]
            id = "eq-10"
            type = "chiller"
            buildingId = "bld-005"
            healthScore = 35
        "#,
    )
    .unwrap();
    assert_eq!(config.processing_delay(), std::time::Duration::from_millis(10));

    let results = analyze(&SensorData::new(), &EnergyData::new(), &config.equipment, Utc::now());
    assert_eq!(results.maintenance_predictions.len(), 1);
    assert_eq!(results.maintenance_predictions[0].equipment_type, "chiller");
    assert_eq!(results.maintenance_predictions[0].building_id, "bld-005");
    assert_eq!(results.maintenance_predictions[0].days_to_failure, 3);
    assert_eq!(results.context.maintenance_schedule.immediate, vec!["eq-10"]);
}

#[test]
fn test_default_agent_config() {
    let config = AgentConfig::default();
    assert_eq!(config.processing_delay_ms, 2000);
    assert_eq!(config.equipment, default_equipment());
}

#[test]
fn test_decisions_and_schedule() {
    let equipment = vec![
        Equipment::new("eq-a", "hvac", "bld-001", 30),
        Equipment::new("eq-b", "pump", "bld-002", 50),
    ];
    let results = analyze(
        &SensorData::new(),
        &energy(&[("bld-001", 1500.0)]),
        &equipment,
        Utc::now(),
    );

    // eq-a: (30-20)/5 = 2 days, eq-b: 6 days; both urgent
    let schedule = &results.context.maintenance_schedule;
    assert_eq!(schedule.immediate, vec!["eq-a", "eq-b"]);
    assert!(schedule.this_week.is_empty());
    assert!(schedule.this_month.is_empty());

    let decisions = &results.context.decisions;
    assert_eq!(decisions.len(), 2);
    assert!(matches!(
        &decisions[0],
        Decision::AutoApproved { recommendation_id, .. } if *recommendation_id == results.recommendations[0].id
    ));
    match &decisions[1] {
        Decision::HumanReviewRequired { alert_ids, .. } => assert_eq!(alert_ids.len(), 2),
        other => panic!("unexpected decision {:?}", other),
    }

    assert_eq!(results.context.critical_alerts, 2);
    assert_eq!(results.context.alerts_generated, 2);
}

#[test]
fn test_results_wire_format() {
    let results = analyze(
        &sensors(&[("sensor-001", "temperature", 35.0)]),
        &energy(&[("bld-001", 1500.0)]),
        &default_equipment(),
        Utc::now(),
    );
    let json = serde_json::to_value(&results).unwrap();

    assert!(json["maintenance_predictions"].is_array());
    assert!(json["energy_predictions"].is_array());
    assert!(json["processing_time"].is_u64());
    assert_eq!(json["alerts"][0]["type"], "environmental");
    assert_eq!(json["alerts"][0]["source"]["type"], "sensor");
    assert!(json["alerts"][0]["buildingId"].is_string());
    assert!(json["recommendations"][0]["estimatedSavings"].is_f64());
    assert!(json["energy_predictions"][0]["predictedConsumption"].is_f64());
    assert_eq!(json["context"]["decisions"][0]["decision"], "auto_approved");
}

#[tokio::test(start_paused = true)]
async fn test_process_reports_processing_time_and_caches_result() {
    let agent = agent();
    assert!(agent.last_results().is_none());
    assert!(!agent.is_processing());

    let results = agent
        .process_campus_data(
            sensors(&[("sensor-001", "temperature", 35.0)]),
            energy(&[("bld-001", 1500.0)]),
        )
        .await
        .unwrap();

    assert!(results.processing_time >= 2000);
    assert!(!agent.is_processing());

    let cached = agent.last_results().unwrap();
    assert_eq!(cached.timestamp, results.timestamp);
    assert_eq!(cached.alerts.len(), results.alerts.len());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_call_rejected_as_busy() {
    let agent = agent();

    let first = {
        let agent = Arc::clone(&agent);
        tokio::spawn(async move {
            agent
                .process_campus_data(SensorData::new(), EnergyData::new())
                .await
        })
    };

    while !agent.is_processing() {
        tokio::task::yield_now().await;
    }

    let second = agent
        .process_campus_data(SensorData::new(), EnergyData::new())
        .await;
    assert_eq!(second.unwrap_err(), AgentError::Busy);

    let first = first.await.unwrap();
    assert!(first.is_ok());
    assert!(!agent.is_processing());

    // Guard released: a fresh call succeeds with a new result
    let third = agent
        .process_campus_data(sensors(&[("sensor-001", "temperature", 22.0)]), EnergyData::new())
        .await
        .unwrap();
    assert_eq!(third.context.sensors_analyzed, 1);
    assert_eq!(agent.last_results().unwrap().context.sensors_analyzed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_call_releases_guard() {
    let agent = agent();

    let pending = {
        let agent = Arc::clone(&agent);
        tokio::spawn(async move {
            agent
                .process_campus_data(SensorData::new(), EnergyData::new())
                .await
        })
    };
    while !agent.is_processing() {
        tokio::task::yield_now().await;
    }

    pending.abort();
    let _ = pending.await;

    assert!(!agent.is_processing());
    assert!(agent.last_results().is_none());
}
