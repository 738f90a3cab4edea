use crate::api::error::AppError;
use crate::notification::{
    Notification, NotificationConfig, NotificationConfigUpdate, NotificationDraft,
    NotificationService,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shared state for the notification API
#[derive(Clone)]
pub struct NotificationAppState {
    pub service: Arc<NotificationService>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    notifications: Vec<Notification>,
    unread_count: usize,
}

#[derive(Serialize)]
struct CreateResponse {
    stored: bool,
    notification: Option<Notification>,
}

/// Result of a mutation; `changed` is false for no-ops (unknown id, nothing to do)
#[derive(Serialize)]
struct MutationResponse {
    changed: bool,
}

pub fn create_notification_router(state: NotificationAppState) -> Router {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications)
                .post(create_notification)
                .delete(clear_notifications),
        )
        .route("/api/notifications/read-all", post(mark_all_read))
        .route(
            "/api/notifications/config",
            get(get_config).put(put_config),
        )
        .route("/api/notifications/:id", delete(remove_notification))
        .route("/api/notifications/:id/read", post(mark_read))
        .with_state(Arc::new(state))
}

/// GET /api/notifications - Newest first
async fn list_notifications(
    State(state): State<Arc<NotificationAppState>>,
) -> Json<ListResponse> {
    Json(ListResponse {
        notifications: state.service.get_notifications(),
        unread_count: state.service.unread_count(),
    })
}

/// POST /api/notifications
async fn create_notification(
    State(state): State<Arc<NotificationAppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateResponse>), AppError> {
    let draft: NotificationDraft = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid notification: {}", e)))?;

    let response = match state.service.add_notification(draft) {
        Some(notification) => (
            StatusCode::CREATED,
            Json(CreateResponse {
                stored: true,
                notification: Some(notification),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(CreateResponse {
                stored: false,
                notification: None,
            }),
        ),
    };
    Ok(response)
}

/// POST /api/notifications/:id/read
async fn mark_read(
    State(state): State<Arc<NotificationAppState>>,
    Path(id): Path<String>,
) -> Json<MutationResponse> {
    Json(MutationResponse {
        changed: state.service.mark_as_read(&id),
    })
}

/// POST /api/notifications/read-all
async fn mark_all_read(State(state): State<Arc<NotificationAppState>>) -> Json<MutationResponse> {
    Json(MutationResponse {
        changed: state.service.mark_all_as_read(),
    })
}

/// DELETE /api/notifications/:id
async fn remove_notification(
    State(state): State<Arc<NotificationAppState>>,
    Path(id): Path<String>,
) -> Json<MutationResponse> {
    Json(MutationResponse {
        changed: state.service.remove_notification(&id),
    })
}

/// DELETE /api/notifications
async fn clear_notifications(
    State(state): State<Arc<NotificationAppState>>,
) -> Json<MutationResponse> {
    let changed = state.service.clear_all();
    if changed {
        info!("Notifications cleared");
    }
    Json(MutationResponse { changed })
}

/// GET /api/notifications/config
async fn get_config(State(state): State<Arc<NotificationAppState>>) -> Json<NotificationConfig> {
    Json(state.service.config())
}

/// PUT /api/notifications/config - Partial update; omitted fields are unchanged
async fn put_config(
    State(state): State<Arc<NotificationAppState>>,
    body: Bytes,
) -> Result<Json<NotificationConfig>, AppError> {
    let update: NotificationConfigUpdate = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid config update: {}", e)))?;

    let config = state.service.update_config(&update)?;
    Ok(Json(config))
}
