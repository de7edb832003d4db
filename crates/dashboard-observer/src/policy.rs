use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ObserverErrKind, ObserverError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverPolicy {
    /// Idle time after which a target is evicted; the boundary itself is kept.
    pub inactivity_timeout_ms: u64,
    /// Period of the background sweep. Zero leaves sweeping to the caller.
    #[serde(default)]
    pub sweep_interval_ms: u64,
}

impl Default for ObserverPolicy {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 30 * 60 * 1000,
            sweep_interval_ms: 0,
        }
    }
}

impl ObserverPolicy {
    pub fn with_timeout(inactivity_timeout: Duration) -> Self {
        Self {
            inactivity_timeout_ms: duration_ms(inactivity_timeout),
            ..Self::default()
        }
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }

    pub fn validate(&self) -> Result<(), ObserverError> {
        if self.inactivity_timeout_ms == 0 {
            return Err(ObserverErrKind::InvalidTimeout.into());
        }
        Ok(())
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let policy = ObserverPolicy::with_timeout(Duration::ZERO);
        assert_eq!(
            policy.validate().unwrap_err().kind(),
            &ObserverErrKind::InvalidTimeout
        );
    }

    #[test]
    fn sweep_interval_zero_means_manual() {
        let mut policy = ObserverPolicy::with_timeout(Duration::from_secs(20));
        assert!(policy.validate().is_ok());
        assert_eq!(policy.sweep_interval(), None);
        policy.sweep_interval_ms = 1_000;
        assert_eq!(policy.sweep_interval(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn policy_reads_json() {
        let policy: ObserverPolicy =
            serde_json::from_str(r#"{"inactivity_timeout_ms":20000}"#).unwrap();
        assert_eq!(policy.inactivity_timeout(), Duration::from_secs(20));
        assert_eq!(policy.sweep_interval_ms, 0);
    }
}
