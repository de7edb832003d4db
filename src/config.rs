//! Datasource instance settings.
//!
//! Mirrors the instance JSON the dashboard hands to the datasource
//! (`url` plus `jsonData`). Interval fields accept a number of milliseconds,
//! a numeric string, or a human readable duration such as `"20s"`.

use std::time::Duration;

use dashboard_observer::ObserverPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::DatasourceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Millis(u64),
    Text(String),
}

impl DurationSetting {
    pub fn resolve(&self, field: &'static str) -> Result<Duration, DatasourceError> {
        match self {
            DurationSetting::Millis(ms) => Ok(Duration::from_millis(*ms)),
            DurationSetting::Text(raw) => {
                let trimmed = raw.trim();
                if let Ok(ms) = trimmed.parse::<u64>() {
                    return Ok(Duration::from_millis(ms));
                }
                humantime::parse_duration(trimmed).map_err(|_| DatasourceError::InvalidDuration {
                    field,
                    value: raw.clone(),
                })
            }
        }
    }
}

impl From<&str> for DurationSetting {
    fn from(value: &str) -> Self {
        DurationSetting::Text(value.to_string())
    }
}

impl From<u64> for DurationSetting {
    fn from(value: u64) -> Self {
        DurationSetting::Millis(value)
    }
}

fn default_poll_interval() -> DurationSetting {
    "1s".into()
}

fn default_script_sync_interval() -> DurationSetting {
    "5s".into()
}

fn default_inactivity_timeout() -> DurationSetting {
    "30m".into()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonData {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: DurationSetting,
    #[serde(default = "default_script_sync_interval")]
    pub script_sync_interval_ms: DurationSetting,
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_ms: DurationSetting,
}

impl Default for JsonData {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            script_sync_interval_ms: default_script_sync_interval(),
            inactivity_timeout_ms: default_inactivity_timeout(),
        }
    }
}

/// Raw instance settings as stored by the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    pub url: String,
    #[serde(default)]
    pub json_data: JsonData,
}

/// Normalised settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasourceSettings {
    pub url: Url,
    /// Zero disables the periodic sweep.
    pub poll_interval: Duration,
    pub script_sync_interval: Duration,
    pub inactivity_timeout: Duration,
}

impl DatasourceSettings {
    pub fn from_instance(instance: &InstanceSettings) -> Result<Self, DatasourceError> {
        let url = Url::parse(&instance.url).map_err(|err| DatasourceError::InvalidUrl {
            url: instance.url.clone(),
            reason: err.to_string(),
        })?;
        let data = &instance.json_data;
        Ok(Self {
            url,
            poll_interval: data.poll_interval_ms.resolve("pollIntervalMs")?,
            script_sync_interval: data
                .script_sync_interval_ms
                .resolve("scriptSyncIntervalMs")?,
            inactivity_timeout: data.inactivity_timeout_ms.resolve("inactivityTimeoutMs")?,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, DatasourceError> {
        let instance: InstanceSettings = serde_json::from_str(raw)?;
        Self::from_instance(&instance)
    }

    pub fn observer_policy(&self) -> ObserverPolicy {
        ObserverPolicy {
            inactivity_timeout_ms: millis(self.inactivity_timeout),
            sweep_interval_ms: millis(self.poll_interval),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
