use crate::agent::AgentError;
use crate::notification::NotificationError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

/// Error body shared by every endpoint
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub(crate) enum AppError {
    ValidationError(String),
    NotFound(String),
    Busy,
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Busy => {
                let body = Json(ErrorResponse {
                    success: false,
                    error: "Agent is already processing".to_string(),
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("2"));
                return response;
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Busy => AppError::Busy,
            AgentError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::InvalidConfig(msg) => AppError::ValidationError(msg),
            NotificationError::Storage(msg) => AppError::Internal(msg),
        }
    }
}
