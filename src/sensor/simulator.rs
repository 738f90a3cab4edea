use crate::clock::Clock;
use crate::sensor::{ReadingQuality, Sensor, SensorReading, SensorType, SimulatorConfig};
use chrono::{NaiveTime, Timelike};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// Produces random, bounded readings for a set of sensors on a per-type cadence.
pub struct SensorSimulator {
    config: SimulatorConfig,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,

    /// Per-sensor ring buffers, oldest reading first
    readings: DashMap<String, VecDeque<SensorReading>>,

    /// Broadcast channel for newly recorded readings
    reading_tx: broadcast::Sender<SensorReading>,

    /// One generation task per running sensor
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SensorSimulator {
    pub fn new(config: SimulatorConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (reading_tx, _) = broadcast::channel(256);

        Self {
            config,
            clock,
            rng: Mutex::new(rng),
            readings: DashMap::new(),
            reading_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Schedule a repeating generation task for every sensor.
    ///
    /// Tasks already running are stopped first. Each task holds only a weak
    /// reference, so dropping the simulator also ends its tasks.
    pub fn start(self: &Arc<Self>, sensors: Vec<Sensor>) {
        self.stop();

        let count = sensors.len();
        let mut handles = Vec::with_capacity(count);

        for sensor in sensors {
            let simulator = Arc::downgrade(self);
            handles.push(tokio::spawn(run_sensor(simulator, sensor)));
        }

        *self.tasks.lock().expect("simulator task lock poisoned") = handles;
        info!(sensors = count, "Sensor simulator started");
    }

    /// Cancel all scheduled generation tasks. Safe to call repeatedly.
    pub fn stop(&self) {
        let handles: Vec<_> = self
            .tasks
            .lock()
            .expect("simulator task lock poisoned")
            .drain(..)
            .collect();

        if handles.is_empty() {
            return;
        }

        for handle in &handles {
            handle.abort();
        }
        info!(sensors = handles.len(), "Sensor simulator stopped");
    }

    pub fn is_running(&self) -> bool {
        !self
            .tasks
            .lock()
            .expect("simulator task lock poisoned")
            .is_empty()
    }

    /// Draw a new reading for `sensor` without recording it.
    pub fn generate_reading(&self, sensor: &Sensor) -> SensorReading {
        let business_hours = is_business_hours(self.clock.local_time());
        let poor_probability = self.config.poor_quality_probability.clamp(0.0, 1.0);

        let (value, poor) = {
            let mut rng = self.rng.lock().expect("simulator rng lock poisoned");
            let value = draw_value(&mut *rng, sensor.sensor_type, business_hours);
            (value, rng.gen_bool(poor_probability))
        };

        SensorReading {
            id: Uuid::now_v7().to_string(),
            sensor_id: sensor.id.clone(),
            timestamp: self.clock.now(),
            value,
            unit: sensor.sensor_type.unit().to_string(),
            quality: if poor {
                ReadingQuality::Poor
            } else {
                ReadingQuality::Good
            },
        }
    }

    /// Append a reading to its sensor's buffer and broadcast it.
    pub fn record_reading(&self, reading: SensorReading) {
        {
            let mut buffer = self.readings.entry(reading.sensor_id.clone()).or_default();
            buffer.push_back(reading.clone());
            while buffer.len() > self.config.history_limit {
                buffer.pop_front();
            }
        }

        debug!(
            sensor_id = %reading.sensor_id,
            value = reading.value,
            quality = ?reading.quality,
            "Recorded sensor reading"
        );

        // No subscribers is fine
        let _ = self.reading_tx.send(reading);
    }

    /// Retained readings for a sensor, oldest first.
    pub fn readings(&self, sensor_id: &str) -> Vec<SensorReading> {
        self.readings
            .get(sensor_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest_reading(&self, sensor_id: &str) -> Option<SensorReading> {
        self.readings
            .get(sensor_id)
            .and_then(|buffer| buffer.back().cloned())
    }

    /// Most recent reading of every sensor that has produced one, ordered by sensor id.
    pub fn latest_readings(&self) -> Vec<SensorReading> {
        let mut latest: Vec<SensorReading> = self
            .readings
            .iter()
            .filter_map(|entry| entry.value().back().cloned())
            .collect();
        latest.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
        latest
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SensorReading> {
        self.reading_tx.subscribe()
    }
}

impl Drop for SensorSimulator {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for handle in tasks.drain(..) {
                handle.abort();
            }
        }
    }
}

async fn run_sensor(simulator: Weak<SensorSimulator>, sensor: Sensor) {
    let mut ticker = interval(sensor.sensor_type.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(simulator) = simulator.upgrade() else {
            break;
        };
        let reading = simulator.generate_reading(&sensor);
        simulator.record_reading(reading);
    }
}

/// 08:00 (inclusive) to 18:00 (exclusive), local time.
pub fn is_business_hours(time: NaiveTime) -> bool {
    (8..18).contains(&time.hour())
}

/// Uniform draw within the type's range, biased by business hours for
/// occupancy and energy. Never leaves `[min, max]`.
fn draw_value<R: Rng>(rng: &mut R, sensor_type: SensorType, business_hours: bool) -> f64 {
    let (min, max) = sensor_type.range();
    let span = max - min;

    match sensor_type {
        SensorType::Occupancy => {
            let upper = if business_hours { max } else { min + span * 0.2 };
            rng.gen_range(min..=upper).round()
        }
        SensorType::Energy => {
            let (low, high) = if business_hours {
                (min + span * 0.4, max)
            } else {
                (min, min + span * 0.6)
            };
            round_hundredths(rng.gen_range(low..=high))
        }
        _ => round_hundredths(rng.gen_range(min..=max)),
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
