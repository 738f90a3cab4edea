use crate::notification::{Notification, NotificationService, SubscriptionId};
use crate::sensor::{SensorReading, SensorSimulator};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

/// Shared application state for WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    pub notifications: Arc<NotificationService>,
    pub simulator: Arc<SensorSimulator>,
}

/// Server → Client messages
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    /// Full notification list after every change, newest first
    Notifications {
        notifications: Vec<Notification>,
        #[serde(rename = "unreadCount")]
        unread_count: usize,
    },
    SensorReading { reading: SensorReading },
}

impl ServerMessage {
    fn snapshot(notifications: Vec<Notification>) -> Self {
        let unread_count = notifications.iter().filter(|n| !n.read).count();
        ServerMessage::Notifications {
            notifications,
            unread_count,
        }
    }
}

/// GET /api/ws - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

pub fn create_ws_router(state: WsAppState) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(Arc::new(state))
}

/// Forward notification snapshots and sensor readings until the client leaves
async fn handle_socket(mut socket: WebSocket, state: Arc<WsAppState>) {
    let (subscription, mut snapshot_rx) = snapshot_feed(&state.notifications);
    let mut reading_rx = state.simulator.subscribe();

    info!("WebSocket client connected");

    let initial = ServerMessage::snapshot(snapshot_rx.borrow_and_update().clone());
    if let Err(e) = send_message(&mut socket, &initial).await {
        error!(error = %e, "Failed to send initial snapshot");
        state.notifications.unsubscribe(subscription);
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            error!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Server push only; client text/binary is ignored
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            Ok(()) = snapshot_rx.changed() => {
                let notifications = snapshot_rx.borrow_and_update().clone();
                let msg = ServerMessage::snapshot(notifications);
                if let Err(e) = send_message(&mut socket, &msg).await {
                    error!(error = %e, "Failed to send notification snapshot");
                    break;
                }
            }

            result = reading_rx.recv() => {
                match result {
                    Ok(reading) => {
                        let msg = ServerMessage::SensorReading { reading };
                        if let Err(e) = send_message(&mut socket, &msg).await {
                            error!(error = %e, "Failed to send sensor reading");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "WebSocket lagged, skipped readings");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Sensor broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }

    state.notifications.unsubscribe(subscription);
    info!("WebSocket connection closed");
}

/// Subscribe to notification changes through a channel that holds only the
/// newest snapshot, so a slow client skips intermediate lists.
fn snapshot_feed(
    service: &NotificationService,
) -> (SubscriptionId, watch::Receiver<Vec<Notification>>) {
    let (snapshot_tx, snapshot_rx) = watch::channel(service.get_notifications());
    let subscription = service.subscribe(move |notifications| {
        snapshot_tx.send_replace(notifications.to_vec());
    });
    (subscription, snapshot_rx)
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notification::{
        MemorySettingsStore, NotificationDraft, NotificationKind, NotificationServiceConfig,
        TracingSink,
    };
    use chrono::Utc;

    fn service() -> NotificationService {
        NotificationService::new(
            NotificationServiceConfig::default(),
            Arc::new(MemorySettingsStore::new()),
            Arc::new(TracingSink),
            Arc::new(ManualClock::at(12, 0)),
        )
    }

    #[tokio::test]
    async fn test_snapshot_feed_keeps_only_latest() {
        let service = service();
        let (subscription, mut rx) = snapshot_feed(&service);
        assert!(rx.borrow_and_update().is_empty());

        // Client not reading: 50 changes collapse into one pending snapshot
        for i in 0..50 {
            service.add_notification(NotificationDraft::new(
                NotificationKind::Info,
                &format!("n{}", i),
                "message",
            ));
        }

        assert!(rx.has_changed().unwrap());
        let latest = rx.borrow_and_update().clone();
        assert_eq!(latest.len(), 50);
        assert_eq!(latest[0].title, "n49");
        assert!(!rx.has_changed().unwrap());

        assert!(service.unsubscribe(subscription));
        // Sender lived in the listener, so the feed ends with the subscription
        assert!(rx.changed().await.is_err());
    }

    #[test]
    fn test_snapshot_message_format() {
        let notification = Notification {
            id: "notif-1".to_string(),
            title: "Sensor Offline".to_string(),
            message: "Sensor in Library went offline".to_string(),
            kind: NotificationKind::Error,
            timestamp: Utc::now(),
            read: false,
            action_url: None,
        };

        let msg = ServerMessage::snapshot(vec![notification]);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "notifications");
        assert_eq!(json["unreadCount"], 1);
        assert_eq!(json["notifications"][0]["type"], "error");
    }
}
