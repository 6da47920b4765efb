use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::modules::chat::{ApplicationError, InvalidIdentity, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl AppError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
            AppError::Application(e) => match e {
                ApplicationError::SessionNotFound(_)
                | ApplicationError::StoreError(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
                ApplicationError::ValidationError(_)
                | ApplicationError::InvalidIdentity(_)
                | ApplicationError::StoreError(StoreError::InvalidIdentity(_)) => {
                    StatusCode::BAD_REQUEST
                }
                ApplicationError::GatewayError(_) | ApplicationError::TurnFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ApplicationError::TurnDiscarded => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[Http] {}", self);
        } else {
            tracing::debug!("[Http] {} {}", status, self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
