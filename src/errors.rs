//! Error types for the datasource layer.

use dashboard_observer::ObserverError;
use pcp_core_types::PcpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasourceError {
    #[error("invalid datasource settings: {0}")]
    InvalidSettings(String),
    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },
    #[error("invalid datasource url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error(transparent)]
    Observer(#[from] ObserverError),
    #[error("target {ref_id} failed: {reason}")]
    Target { ref_id: String, reason: String },
    #[error("logging init failed: {0}")]
    Logging(String),
}

impl From<serde_json::Error> for DatasourceError {
    fn from(value: serde_json::Error) -> Self {
        DatasourceError::InvalidSettings(value.to_string())
    }
}

impl From<DatasourceError> for PcpError {
    fn from(value: DatasourceError) -> Self {
        PcpError::new(value.to_string())
    }
}
