//! Error types for ingestion and dashboard state handling.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// The response body was not the expected `setResponse(<json>)` envelope.
    #[error("Invalid response format: {0}")]
    Format(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Ingestion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ingestion was cancelled")]
    Cancelled,

    #[error("An ingestion is already in flight")]
    IngestionInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Format(err.to_string())
    }
}

impl From<toml::de::Error> for DashboardError {
    fn from(err: toml::de::Error) -> Self {
        DashboardError::Config {
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DashboardError {
    fn from(err: toml::ser::Error) -> Self {
        DashboardError::Config {
            message: err.to_string(),
        }
    }
}

impl DashboardError {
    /// Ingestion failures that leave the previous dataset in place.
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::Format(_)
                | DashboardError::Network(_)
                | DashboardError::Timeout(_)
                | DashboardError::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
