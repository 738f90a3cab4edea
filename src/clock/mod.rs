// Wall-clock abstraction (time-of-day rules and record timestamps)

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use std::sync::RwLock;

/// Source of the current time.
///
/// Business-hours and quiet-hours rules read `local_time`; records are
/// stamped with `now`. Periodic scheduling itself goes through tokio timers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn local_time(&self) -> NaiveTime;
}

/// Real system clock in the host's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Manually driven clock. Local time is the UTC time of the stored instant.
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Clock set to today's date at `hour:minute`.
    pub fn at(hour: u32, minute: u32) -> Self {
        let clock = Self::new(Utc::now());
        clock.set_local_time(hour, minute);
        clock
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().expect("ManualClock lock poisoned") = now;
    }

    /// Move the time of day to `hour:minute`, keeping the date.
    pub fn set_local_time(&self, hour: u32, minute: u32) {
        let mut now = self.now.write().expect("ManualClock lock poisoned");
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            *now = now.date_naive().and_time(time).and_utc();
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("ManualClock lock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("ManualClock lock poisoned")
    }

    fn local_time(&self) -> NaiveTime {
        self.now().time()
    }
}
