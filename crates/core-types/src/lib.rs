use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the datasource crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PcpError {
    #[error("{message}")]
    Message { message: String },
}

impl PcpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identity of a target across query cycles.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TargetKey(pub String);

impl TargetKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum TargetFormat {
    #[default]
    TimeSeries,
    Heatmap,
    Table,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::TimeSeries => "time_series",
            TargetFormat::Heatmap => "heatmap",
            TargetFormat::Table => "table",
        }
    }
}

/// One metric expression inside a panel query, as sent by the dashboard.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct QueryTarget {
    pub ref_id: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub expr: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub format: TargetFormat,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub legend_format: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub url: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub hostspec: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub hide: bool,
}

impl QueryTarget {
    pub fn new(ref_id: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            expr: expr.into(),
            ..Self::default()
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Default for TimeRange {
    fn default() -> Self {
        let to = Utc::now();
        Self {
            from: to - chrono::Duration::hours(6),
            to,
        }
    }
}

/// A full panel query; re-issued by the dashboard on every refresh.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query {
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub request_id: RequestId,
    #[cfg_attr(feature = "serde-full", serde(default, rename = "dashboardUID"))]
    pub dashboard_uid: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub panel_id: Option<u64>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub range: TimeRange,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub interval_ms: u64,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub max_data_points: u32,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub targets: Vec<QueryTarget>,
}

/// A target bound to the dashboard panel that requested it.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DashboardTarget {
    pub dashboard_uid: Option<String>,
    pub panel_id: Option<u64>,
    pub target: QueryTarget,
}

impl DashboardTarget {
    pub fn scoped(query: &Query, target: &QueryTarget) -> Self {
        Self {
            dashboard_uid: query.dashboard_uid.clone(),
            panel_id: query.panel_id,
            target: target.clone(),
        }
    }

    pub fn ref_id(&self) -> &str {
        &self.target.ref_id
    }
}

impl fmt::Display for DashboardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dashboard={} panel={} ref={}",
            self.dashboard_uid.as_deref().unwrap_or("-"),
            self.panel_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".into()),
            self.target.ref_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> Query {
        Query {
            dashboard_uid: Some("dash-1".into()),
            panel_id: Some(2),
            ..Query::default()
        }
    }

    #[test]
    fn scoped_target_carries_panel_identity() {
        let target = QueryTarget::new("A", "kernel.all.load");
        let scoped = DashboardTarget::scoped(&query(), &target);
        assert_eq!(scoped.dashboard_uid.as_deref(), Some("dash-1"));
        assert_eq!(scoped.panel_id, Some(2));
        assert_eq!(scoped.ref_id(), "A");
        assert_eq!(scoped.to_string(), "dashboard=dash-1 panel=2 ref=A");
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn targets_compare_structurally() {
        let a = QueryTarget::new("A", "mem.util.used");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.legend_format = Some("$metric".into());
        assert_ne!(a, b);
    }

    #[cfg(feature = "serde-full")]
    #[test]
    fn query_target_reads_dashboard_json() {
        let raw = r#"{"refId":"A","expr":"disk.dev.read","legendFormat":"$instance","format":"heatmap"}"#;
        let target: QueryTarget = serde_json::from_str(raw).unwrap();
        assert_eq!(target.ref_id, "A");
        assert_eq!(target.format, TargetFormat::Heatmap);
        assert_eq!(target.legend_format.as_deref(), Some("$instance"));
        assert!(!target.hide);
    }
}
