use super::Notification;
use tracing::info;

/// Side effects allowed for one notification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    pub sound: bool,
    pub desktop: bool,
}

impl Delivery {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_silent(&self) -> bool {
        !self.sound && !self.desktop
    }
}

/// Receives every stored notification together with its delivery decision.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification, delivery: Delivery);
}

/// Default sink: records the delivery decision in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification, delivery: Delivery) {
        info!(
            notification_id = %notification.id,
            kind = ?notification.kind,
            title = %notification.title,
            sound = delivery.sound,
            desktop = delivery.desktop,
            "Notification delivered"
        );
    }
}
