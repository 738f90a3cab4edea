use crate::clock::Clock;
use crate::notification::{
    Delivery, Notification, NotificationConfig, NotificationConfigUpdate, NotificationDraft,
    NotificationKind, NotificationServiceConfig, NotificationSink, SettingsStore,
};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fixed key the notification preferences are stored under
pub const SETTINGS_KEY: &str = "campus-notification-settings";

/// Callback invoked with a full snapshot after every change.
pub type Listener = Arc<dyn Fn(&[Notification]) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Errors from updating notification preferences
#[derive(Debug)]
pub enum NotificationError {
    InvalidConfig(String),
    Storage(String),
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            NotificationError::Storage(msg) => write!(f, "failed to persist configuration: {}", msg),
        }
    }
}

impl std::error::Error for NotificationError {}

/// Canned notifications injected by the simulation loop
const TEMPLATES: [(NotificationKind, &str, &str, Option<&str>); 5] = [
    (
        NotificationKind::Warning,
        "High Energy Usage",
        "Engineering Building energy consumption is 15% above baseline",
        Some("/energy"),
    ),
    (
        NotificationKind::Info,
        "Maintenance Scheduled",
        "HVAC maintenance scheduled for the Library tomorrow at 09:00",
        Some("/maintenance"),
    ),
    (
        NotificationKind::Error,
        "Sensor Offline",
        "Temperature sensor in Lab 3 stopped reporting",
        Some("/sensors"),
    ),
    (
        NotificationKind::Success,
        "Energy Target Met",
        "Campus energy consumption is 8% below today's target",
        None,
    ),
    (
        NotificationKind::Warning,
        "Occupancy Alert",
        "Main Hall is approaching maximum occupancy",
        Some("/buildings"),
    ),
];

/// Central store of user notifications.
///
/// Newest notifications come first. Every mutation that changes the list is
/// followed by a snapshot fan-out to all subscribers; listeners run after
/// internal locks are released, so they may call back into the service.
/// Only one fan-out runs at a time: changes made while it is running (from a
/// listener or another thread) are picked up by another round, so the last
/// snapshot every listener sees is the current list.
pub struct NotificationService {
    options: NotificationServiceConfig,
    notifications: RwLock<VecDeque<Notification>>,
    config: RwLock<NotificationConfig>,
    store: Arc<dyn SettingsStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    listeners: DashMap<SubscriptionId, Listener>,
    next_subscription: AtomicU64,
    /// A change happened that listeners have not seen yet
    fan_out_pending: AtomicBool,
    /// Some caller is currently delivering snapshots
    fan_out_active: AtomicBool,
    rng: Mutex<StdRng>,
    simulation: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationService {
    /// Create the service, loading persisted preferences over the defaults.
    pub fn new(
        options: NotificationServiceConfig,
        store: Arc<dyn SettingsStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = load_config(store.as_ref());
        if options.capacity == 0 {
            warn!("Notification capacity 0 would drop every notification, keeping 1");
        }
        let options = NotificationServiceConfig {
            capacity: options.capacity.max(1),
            ..options
        };
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            notifications: RwLock::new(VecDeque::with_capacity(options.capacity)),
            options,
            config: RwLock::new(config),
            store,
            sink,
            clock,
            listeners: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            fan_out_pending: AtomicBool::new(false),
            fan_out_active: AtomicBool::new(false),
            rng: Mutex::new(rng),
            simulation: Mutex::new(None),
        }
    }

    /// Store and deliver a notification.
    ///
    /// Returns `None` when critical-only mode drops a non-error draft; such a
    /// draft is neither stored nor delivered.
    pub fn add_notification(&self, draft: NotificationDraft) -> Option<Notification> {
        let config = self.config();

        if config.critical_only && draft.kind != NotificationKind::Error {
            debug!(title = %draft.title, kind = ?draft.kind, "Dropped by critical-only filter");
            return None;
        }

        let notification = Notification {
            id: Uuid::now_v7().to_string(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            timestamp: self.clock.now(),
            read: false,
            action_url: draft.action_url,
        };

        {
            let mut list = self.write_list();
            list.push_front(notification.clone());
            list.truncate(self.options.capacity);
        }

        let delivery = self.delivery_for(&config);
        self.sink.deliver(&notification, delivery);
        self.notify_subscribers();

        Some(notification)
    }

    /// Snapshot of all notifications, newest first.
    pub fn get_notifications(&self) -> Vec<Notification> {
        self.read_list().iter().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        self.read_list().iter().filter(|n| !n.read).count()
    }

    /// Returns false (and notifies nobody) if the id is unknown or already read.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let changed = {
            let mut list = self.write_list();
            match list.iter_mut().find(|n| n.id == id) {
                Some(n) if !n.read => {
                    n.read = true;
                    true
                }
                _ => false,
            }
        };

        if changed {
            self.notify_subscribers();
        }
        changed
    }

    /// Returns false if nothing was unread.
    pub fn mark_all_as_read(&self) -> bool {
        let changed = {
            let mut list = self.write_list();
            let mut changed = false;
            for n in list.iter_mut().filter(|n| !n.read) {
                n.read = true;
                changed = true;
            }
            changed
        };

        if changed {
            self.notify_subscribers();
        }
        changed
    }

    pub fn remove_notification(&self, id: &str) -> bool {
        let removed = {
            let mut list = self.write_list();
            let before = list.len();
            list.retain(|n| n.id != id);
            list.len() != before
        };

        if removed {
            self.notify_subscribers();
        }
        removed
    }

    /// Returns false if the list was already empty.
    pub fn clear_all(&self) -> bool {
        let cleared = {
            let mut list = self.write_list();
            let had_any = !list.is_empty();
            list.clear();
            had_any
        };

        if cleared {
            self.notify_subscribers();
        }
        cleared
    }

    /// Register a listener; it receives a snapshot after every change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[Notification]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Arc::new(listener));
        debug!(subscription = id.0, "Notification subscriber added");
        id
    }

    /// Returns false if the handle was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            debug!(subscription = id.0, "Notification subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn config(&self) -> NotificationConfig {
        self.config
            .read()
            .expect("notification config lock poisoned")
            .clone()
    }

    /// Apply a partial preference update and persist it.
    ///
    /// The in-memory config only changes once the store accepted the new value.
    pub fn update_config(
        &self,
        update: &NotificationConfigUpdate,
    ) -> Result<NotificationConfig, NotificationError> {
        let mut current = self
            .config
            .write()
            .expect("notification config lock poisoned");
        let merged = current.merged(update);

        merged
            .quiet_hours
            .validate()
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?;

        let serialized = serde_json::to_string(&merged)
            .map_err(|e| NotificationError::Storage(e.to_string()))?;
        self.store
            .save(SETTINGS_KEY, &serialized)
            .map_err(|e| NotificationError::Storage(format!("{:#}", e)))?;

        *current = merged.clone();
        info!(
            critical_only = merged.critical_only,
            quiet_hours = merged.quiet_hours.enabled,
            "Notification preferences updated"
        );

        Ok(merged)
    }

    /// Whether quiet hours are enabled and the clock's local time is inside them.
    pub fn is_quiet_time(&self) -> bool {
        is_quiet(&self.config(), self.clock.as_ref())
    }

    /// One simulation step: with the configured probability, inject a canned notification.
    pub fn simulate_tick(&self) -> Option<Notification> {
        let draft = {
            let mut rng = self.rng.lock().expect("notification rng lock poisoned");
            let probability = self.options.simulation_probability.clamp(0.0, 1.0);
            if !rng.gen_bool(probability) {
                return None;
            }
            let (kind, title, message, action_url) = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
            NotificationDraft {
                title: title.to_string(),
                message: message.to_string(),
                kind,
                action_url: action_url.map(str::to_string),
            }
        };

        self.add_notification(draft)
    }

    /// Run `simulate_tick` every `simulation_interval_seconds` until stopped.
    ///
    /// The first tick happens one interval after start. Restarting replaces the running loop.
    pub fn start_simulation(self: &Arc<Self>) {
        self.stop_simulation();

        let period = Duration::from_secs(self.options.simulation_interval_seconds.max(1));
        let service = Arc::downgrade(self);
        let handle = tokio::spawn(run_simulation(service, period));

        *self.simulation.lock().expect("simulation lock poisoned") = Some(handle);
        info!(interval_seconds = period.as_secs(), "Notification simulation started");
    }

    pub fn stop_simulation(&self) {
        if let Some(handle) = self.simulation.lock().expect("simulation lock poisoned").take() {
            handle.abort();
            info!("Notification simulation stopped");
        }
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation
            .lock()
            .expect("simulation lock poisoned")
            .is_some()
    }

    fn delivery_for(&self, config: &NotificationConfig) -> Delivery {
        if !config.enabled || is_quiet(config, self.clock.as_ref()) {
            return Delivery::none();
        }
        Delivery {
            sound: config.sound,
            desktop: config.desktop,
        }
    }

    fn notify_subscribers(&self) {
        self.fan_out_pending.store(true, Ordering::SeqCst);

        loop {
            let Some(active) = FanOutGuard::acquire(&self.fan_out_active) else {
                // The running fan-out delivers this change in its next round
                return;
            };

            while self.fan_out_pending.swap(false, Ordering::SeqCst) {
                let listeners: Vec<Listener> = self
                    .listeners
                    .iter()
                    .map(|entry| Arc::clone(entry.value()))
                    .collect();
                if listeners.is_empty() {
                    continue;
                }

                let snapshot = self.get_notifications();
                for listener in listeners {
                    listener(&snapshot);
                }
            }

            drop(active);
            // A change flagged after the last round but before release would otherwise go undelivered
            if !self.fan_out_pending.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    fn read_list(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<Notification>> {
        self.notifications
            .read()
            .expect("notification list lock poisoned")
    }

    fn write_list(&self) -> std::sync::RwLockWriteGuard<'_, VecDeque<Notification>> {
        self.notifications
            .write()
            .expect("notification list lock poisoned")
    }
}

impl Drop for NotificationService {
    fn drop(&mut self) {
        if let Ok(mut simulation) = self.simulation.lock() {
            if let Some(handle) = simulation.take() {
                handle.abort();
            }
        }
    }
}

/// Marks a fan-out in progress; cleared on drop, including when a listener panics.
struct FanOutGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FanOutGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FanOutGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

async fn run_simulation(service: Weak<NotificationService>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(service) = service.upgrade() else {
            break;
        };
        if let Some(notification) = service.simulate_tick() {
            debug!(notification_id = %notification.id, "Simulated notification injected");
        }
    }
}

fn is_quiet(config: &NotificationConfig, clock: &dyn Clock) -> bool {
    if !config.quiet_hours.enabled {
        return false;
    }
    match config.quiet_hours.covers(clock.local_time()) {
        Ok(quiet) => quiet,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed quiet hours");
            false
        }
    }
}

/// Stored overrides merged into defaults; unreadable values fall back to defaults.
fn load_config(store: &dyn SettingsStore) -> NotificationConfig {
    let stored = match store.load(SETTINGS_KEY) {
        Ok(Some(value)) => value,
        Ok(None) => return NotificationConfig::default(),
        Err(e) => {
            warn!(error = %e, "Failed to load notification preferences, using defaults");
            return NotificationConfig::default();
        }
    };

    match serde_json::from_str::<NotificationConfig>(&stored) {
        Ok(config) => {
            info!("Loaded stored notification preferences");
            config
        }
        Err(e) => {
            warn!(error = %e, "Stored notification preferences unreadable, using defaults");
            NotificationConfig::default()
        }
    }
}
