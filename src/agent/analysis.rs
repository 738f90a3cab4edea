use super::{
    AgentContext, AgentResults, Alert, AlertSeverity, AlertSource, AlertType, Decision,
    EnergyData, EnergyPrediction, Equipment, Impact, MaintenancePrediction, MaintenanceSchedule,
    Priority, Recommendation, RecommendationType, SensorData, SourceType,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Consumption above which a building gets an energy recommendation
const HIGH_CONSUMPTION: f64 = 1200.0;
/// Share of consumption assumed recoverable
const SAVINGS_RATE: f64 = 0.15;
/// Dollars per kWh
const ENERGY_PRICE: f64 = 0.15;
const NEXT_DAY_FACTOR: f64 = 0.95;
const ENERGY_CONFIDENCE: f64 = 0.82;

const HEALTH_THRESHOLD: u32 = 60;
const MAINTENANCE_CONFIDENCE: f64 = 0.85;
/// Predictions due within this many days are urgent
const URGENT_DAYS: u32 = 7;

/// Acceptable `(min, max)` for a sensor type; `None` for types never checked.
pub fn threshold_for(sensor_type: &str) -> Option<(f64, f64)> {
    match sensor_type {
        "temperature" => Some((15.0, 30.0)),
        "humidity" => Some((20.0, 80.0)),
        "energy" => Some((0.0, 2500.0)),
        "air_quality" => Some((0.0, 300.0)),
        _ => None,
    }
}

/// `max(1, (health - 20) / 5)` with integer division.
pub fn days_to_failure(health_score: u32) -> u32 {
    (health_score.saturating_sub(20) / 5).max(1)
}

/// Run every check over the snapshot. `processing_time` is left at zero.
pub fn analyze(
    sensor_data: &SensorData,
    energy_data: &EnergyData,
    equipment: &[Equipment],
    now: DateTime<Utc>,
) -> AgentResults {
    let mut alerts = detect_anomalies(sensor_data, now);
    let anomalies_detected = alerts.len();

    let (recommendations, energy_predictions) = analyze_energy(energy_data, now);

    let (maintenance_predictions, maintenance_alerts) = predict_maintenance(equipment, now);
    alerts.extend(maintenance_alerts);

    let decisions = make_decisions(&alerts, &recommendations);
    let maintenance_schedule = build_schedule(&maintenance_predictions);

    let context = AgentContext {
        sensors_analyzed: sensor_data.len(),
        buildings_analyzed: energy_data.len(),
        anomalies_detected,
        alerts_generated: alerts.len(),
        critical_alerts: alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count(),
        recommendations_generated: recommendations.len(),
        maintenance_predictions: maintenance_predictions.len(),
        energy_predictions: energy_predictions.len(),
        decisions,
        maintenance_schedule,
    };

    AgentResults {
        alerts,
        recommendations,
        maintenance_predictions,
        energy_predictions,
        context,
        timestamp: now,
        processing_time: 0,
    }
}

/// One environmental alert per reading strictly outside its type's range.
fn detect_anomalies(sensor_data: &SensorData, now: DateTime<Utc>) -> Vec<Alert> {
    sensor_data
        .iter()
        .filter_map(|(sensor_id, sample)| {
            let (min, max) = threshold_for(&sample.sensor_type)?;
            if sample.value >= min && sample.value <= max {
                return None;
            }

            let unit = sample.unit.as_deref().unwrap_or("");
            Some(Alert {
                id: format!("alert-{}", Uuid::now_v7()),
                alert_type: AlertType::Environmental,
                severity: AlertSeverity::Warning,
                title: "Sensor Anomaly Detected".to_string(),
                message: format!(
                    "Sensor {} reported {}{} ({}), outside the acceptable range {} to {}",
                    sensor_id, sample.value, unit, sample.sensor_type, min, max
                ),
                source: AlertSource {
                    source_type: SourceType::Sensor,
                    id: sensor_id.clone(),
                },
                building_id: sample.building_id.clone(),
                timestamp: now,
                acknowledged: false,
                resolved: false,
                actions: vec![
                    "Investigate sensor".to_string(),
                    "Check equipment status".to_string(),
                ],
            })
        })
        .collect()
}

fn analyze_energy(
    energy_data: &EnergyData,
    now: DateTime<Utc>,
) -> (Vec<Recommendation>, Vec<EnergyPrediction>) {
    let tomorrow = (now + Duration::days(1)).date_naive();
    let mut recommendations = Vec::new();
    let mut predictions = Vec::new();

    for (building_id, record) in energy_data {
        let consumption = record.current_consumption;
        if consumption <= HIGH_CONSUMPTION {
            continue;
        }

        let potential_savings = consumption * SAVINGS_RATE;
        recommendations.push(Recommendation {
            id: format!("rec-{}", Uuid::now_v7()),
            recommendation_type: RecommendationType::Energy,
            title: "Energy Consumption Optimization".to_string(),
            description: format!(
                "Reduce energy consumption in building {} (current {} kWh)",
                building_id, consumption
            ),
            building_id: building_id.clone(),
            impact: Impact::High,
            estimated_savings: potential_savings * ENERGY_PRICE,
            actions: vec![
                "Adjust HVAC temperature setpoints".to_string(),
                "Implement smart lighting schedules".to_string(),
                "Optimize equipment runtime".to_string(),
            ],
            priority: 8,
        });

        predictions.push(EnergyPrediction {
            building_id: building_id.clone(),
            date: tomorrow,
            current_consumption: consumption,
            predicted_consumption: consumption * NEXT_DAY_FACTOR,
            confidence: ENERGY_CONFIDENCE,
        });
    }

    (recommendations, predictions)
}

fn predict_maintenance(
    equipment: &[Equipment],
    now: DateTime<Utc>,
) -> (Vec<MaintenancePrediction>, Vec<Alert>) {
    let mut predictions = Vec::new();
    let mut alerts = Vec::new();

    for item in equipment.iter().filter(|e| e.health_score < HEALTH_THRESHOLD) {
        let days = days_to_failure(item.health_score);
        let urgent = days <= URGENT_DAYS;

        predictions.push(MaintenancePrediction {
            equipment_id: item.id.clone(),
            equipment_type: item.equipment_type.clone(),
            building_id: item.building_id.clone(),
            health_score: item.health_score,
            days_to_failure: days,
            predicted_failure_date: now + Duration::days(i64::from(days)),
            confidence: MAINTENANCE_CONFIDENCE,
            recommended_action: format!(
                "Schedule preventive maintenance for {}",
                item.equipment_type
            ),
            priority: if urgent { Priority::High } else { Priority::Medium },
        });

        alerts.push(Alert {
            id: format!("alert-{}", Uuid::now_v7()),
            alert_type: AlertType::Maintenance,
            severity: if urgent {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            },
            title: "Maintenance Required".to_string(),
            message: format!(
                "Equipment {} ({}) health score {}, failure predicted in {} days",
                item.id, item.equipment_type, item.health_score, days
            ),
            source: AlertSource {
                source_type: SourceType::Equipment,
                id: item.id.clone(),
            },
            building_id: Some(item.building_id.clone()),
            timestamp: now,
            acknowledged: false,
            resolved: false,
            actions: vec![format!(
                "Schedule preventive maintenance for {}",
                item.equipment_type
            )],
        });
    }

    (predictions, alerts)
}

/// Auto-approve non-critical energy recommendations; route critical alerts to a human.
fn make_decisions(alerts: &[Alert], recommendations: &[Recommendation]) -> Vec<Decision> {
    let mut decisions: Vec<Decision> = recommendations
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::Energy && r.impact != Impact::Critical)
        .map(|r| Decision::AutoApproved {
            recommendation_id: r.id.clone(),
            reason: "Low risk energy optimization".to_string(),
        })
        .collect();

    let critical: Vec<String> = alerts
        .iter()
        .filter(|a| a.severity == AlertSeverity::Critical)
        .map(|a| a.id.clone())
        .collect();

    if !critical.is_empty() {
        decisions.push(Decision::HumanReviewRequired {
            reason: format!(
                "{} critical alerts require immediate attention",
                critical.len()
            ),
            alert_ids: critical,
        });
    }

    decisions
}

fn build_schedule(predictions: &[MaintenancePrediction]) -> MaintenanceSchedule {
    let mut schedule = MaintenanceSchedule::default();

    for prediction in predictions {
        let id = prediction.equipment_id.clone();
        // Urgent items go first regardless of the day count
        if prediction.priority == Priority::High {
            schedule.immediate.push(id);
            continue;
        }
        match prediction.days_to_failure {
            0..=3 => schedule.immediate.push(id),
            4..=7 => schedule.this_week.push(id),
            8..=30 => schedule.this_month.push(id),
            _ => schedule.next_quarter.push(id),
        }
    }

    schedule
}
