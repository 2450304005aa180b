use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the payment platform on a non-2xx response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, error_code: &str, message: &str) -> Self {
        Self {
            status,
            error_code: error_code.to_string(),
            message: message.to_string(),
            error_type: None,
        }
    }

    /// Server-side failures are retried by the platform itself, so nothing is queued locally.
    pub fn platform_retries(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} [{}] {}", self.status, self.error_code, self.message)
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API error: {0}")]
    Api(ApiError),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("No shareholder mapping for ubo {ubo} of shop {shop_id}")]
    MappingNotFound { shop_id: String, ubo: u32 },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        SyncError::Api(err)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
