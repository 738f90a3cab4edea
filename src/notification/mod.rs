// Notification store, delivery policy and settings persistence

pub mod config;
mod quiet_hours;
mod service;
mod sink;
mod store;


pub use config::NotificationServiceConfig;
pub use quiet_hours::{hhmm, in_window, parse_hhmm, QuietHoursError};
pub use service::{Listener, NotificationError, NotificationService, SubscriptionId, SETTINGS_KEY};
pub use sink::{Delivery, NotificationSink, TracingSink};
pub use store::{MemorySettingsStore, SettingsStore, SqliteSettingsStore};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification category. Only `Error` passes the critical-only filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

/// A user-facing notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

/// Caller-supplied part of a notification; id, timestamp and read state are assigned on add.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            kind,
            action_url: None,
        }
    }

    pub fn with_action_url(mut self, url: &str) -> Self {
        self.action_url = Some(url.to_string());
        self
    }
}

/// User notification preferences, persisted in the settings store.
///
/// Missing fields in a stored value fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    /// Master switch for sound/desktop delivery
    pub enabled: bool,
    pub sound: bool,
    pub desktop: bool,
    /// Drop everything except `error` notifications
    pub critical_only: bool,
    pub quiet_hours: QuietHours,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: true,
            critical_only: false,
            quiet_hours: QuietHours::default(),
        }
    }
}

/// Daily window ("HH:MM" to "HH:MM") during which delivery side effects are suppressed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: String,
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".to_string(),
            end: "08:00".to_string(),
        }
    }
}

impl QuietHours {
    /// Whether `time` falls inside the window, ignoring `enabled`.
    ///
    /// Both ends are inclusive. A window whose start is after its end spans midnight.
    pub fn covers(&self, time: NaiveTime) -> Result<bool, QuietHoursError> {
        let start = parse_hhmm(&self.start)?;
        let end = parse_hhmm(&self.end)?;
        Ok(in_window(hhmm(time), start, end))
    }

    pub fn validate(&self) -> Result<(), QuietHoursError> {
        parse_hhmm(&self.start)?;
        parse_hhmm(&self.end)?;
        Ok(())
    }
}

/// Partial update body; only fields present are changed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfigUpdate {
    pub enabled: Option<bool>,
    pub sound: Option<bool>,
    pub desktop: Option<bool>,
    pub critical_only: Option<bool>,
    pub quiet_hours: Option<QuietHoursUpdate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuietHoursUpdate {
    pub enabled: Option<bool>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl NotificationConfig {
    /// Apply a partial update, returning the resulting config.
    pub fn merged(&self, update: &NotificationConfigUpdate) -> NotificationConfig {
        let mut cfg = self.clone();

        if let Some(v) = update.enabled {
            cfg.enabled = v;
        }
        if let Some(v) = update.sound {
            cfg.sound = v;
        }
        if let Some(v) = update.desktop {
            cfg.desktop = v;
        }
        if let Some(v) = update.critical_only {
            cfg.critical_only = v;
        }
        if let Some(quiet) = &update.quiet_hours {
            if let Some(v) = quiet.enabled {
                cfg.quiet_hours.enabled = v;
            }
            if let Some(v) = &quiet.start {
                cfg.quiet_hours.start = v.clone();
            }
            if let Some(v) = &quiet.end {
                cfg.quiet_hours.end = v.clone();
            }
        }

        cfg
    }
}
