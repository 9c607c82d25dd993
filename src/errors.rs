use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::weather::ErrorBody;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent an incomplete request
    #[error("{0}")]
    Validation(String),
    /// Third-party provider answered with a non-success status
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
    /// Record store failed while serving a read
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Internal(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(msg) => ErrorBody { error: msg, message: None },
            ApiError::Upstream(msg) | ApiError::Internal(msg) => {
                error!("Weather API error: {}", msg);
                ErrorBody {
                    error: "Failed to fetch weather data".to_string(),
                    message: Some(msg),
                }
            }
            ApiError::Store(msg) => {
                error!("Record store error: {}", msg);
                ErrorBody {
                    error: "Failed to fetch energy generation records".to_string(),
                    message: Some(msg),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Open-Meteo API error: {0}")]
    Status(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Status(_) => ApiError::Upstream(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    Poisoned,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Error)]
#[error("invalid schedule '{expression}': {reason}")]
pub struct ScheduleError {
    pub expression: String,
    pub reason: String,
}
