use chrono::{DateTime, Utc};
use pcp_core_types::TargetKey;
use serde::{Deserialize, Serialize};

use crate::errors::ObserverError;

/// Last sighting of one target.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotEntry<T> {
    pub key: TargetKey,
    pub last_target: T,
    pub last_seen_at: DateTime<Utc>,
}

/// Which listener hook a failure came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    Update,
    Inactive,
}

/// A listener call that returned an error. The observer has already applied
/// the state change when this is recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct CallbackFailure {
    pub kind: CallbackKind,
    pub error: ObserverError,
}

/// Outcome of one observe cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObserveStats {
    pub seen: usize,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failures: Vec<CallbackFailure>,
}

/// Outcome of one inactivity sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepStats {
    pub scanned: usize,
    pub evicted: usize,
    pub failures: Vec<CallbackFailure>,
}

impl SweepStats {
    pub fn is_empty(&self) -> bool {
        self.evicted == 0 && self.failures.is_empty()
    }
}
