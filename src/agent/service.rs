use crate::agent::{analysis, AgentConfig, AgentResults, EnergyData, SensorData};
use crate::clock::Clock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

/// Agent failures
#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Another analysis is still in flight
    Busy,
    /// The analysis itself failed unexpectedly
    Internal(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Busy => write!(f, "agent is already processing"),
            AgentError::Internal(msg) => write!(f, "agent processing failed: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {}

/// Stub analysis agent. At most one `process_campus_data` runs at a time.
pub struct CampusAgent {
    config: AgentConfig,
    clock: Arc<dyn Clock>,
    processing: AtomicBool,
    last_results: RwLock<Option<AgentResults>>,
}

/// Clears the in-flight flag on drop (completion, error, panic or cancellation).
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CampusAgent {
    pub fn new(config: AgentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            processing: AtomicBool::new(false),
            last_results: RwLock::new(None),
        }
    }

    /// Analyze a snapshot after the configured artificial delay.
    ///
    /// Fails with `AgentError::Busy` before doing any work if another call is
    /// in flight. There is no timeout and no retry.
    pub async fn process_campus_data(
        &self,
        sensor_data: SensorData,
        energy_data: EnergyData,
    ) -> Result<AgentResults, AgentError> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            warn!("Rejected campus analysis: already processing");
            return Err(AgentError::Busy);
        };

        let started = Instant::now();
        info!(
            sensors = sensor_data.len(),
            buildings = energy_data.len(),
            "Processing campus data"
        );

        sleep(self.config.processing_delay()).await;

        let equipment = self.config.equipment.clone();
        let now = self.clock.now();
        let mut results = tokio::task::spawn_blocking(move || {
            analysis::analyze(&sensor_data, &energy_data, &equipment, now)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Campus analysis task failed");
            AgentError::Internal(e.to_string())
        })?;

        results.processing_time = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        *self
            .last_results
            .write()
            .expect("agent results lock poisoned") = Some(results.clone());

        info!(
            alerts = results.alerts.len(),
            recommendations = results.recommendations.len(),
            maintenance_predictions = results.maintenance_predictions.len(),
            energy_predictions = results.energy_predictions.len(),
            processing_time_ms = results.processing_time,
            "Campus analysis complete"
        );

        Ok(results)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Result of the most recent successful call.
    pub fn last_results(&self) -> Option<AgentResults> {
        self.last_results
            .read()
            .expect("agent results lock poisoned")
            .clone()
    }
}
