use thiserror::Error;

use pcp_core_types::{PcpError, TargetKey};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ObserverErrKind {
    #[error("listener failed for {key}: {reason}")]
    Listener { key: TargetKey, reason: String },
    #[error("inactivity timeout must be greater than zero")]
    InvalidTimeout,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(transparent)]
pub struct ObserverError(pub ObserverErrKind);

impl ObserverError {
    pub fn new(kind: ObserverErrKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &ObserverErrKind {
        &self.0
    }
}

impl From<ObserverError> for PcpError {
    fn from(value: ObserverError) -> Self {
        PcpError::new(value.to_string())
    }
}

impl From<ObserverErrKind> for ObserverError {
    fn from(kind: ObserverErrKind) -> Self {
        ObserverError(kind)
    }
}
