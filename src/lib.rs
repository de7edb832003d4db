//! PCP datasource core.
//!
//! Hosts the owner side of dashboard target tracking: instance settings,
//! logging bootstrap and the query cycle that feeds the
//! [`dashboard_observer`] crate.

pub mod config;
pub mod datasource;
pub mod errors;
pub mod telemetry;

pub use config::{DatasourceSettings, DurationSetting, InstanceSettings, JsonData};
pub use datasource::{DatasourceBase, QueryResponse, TargetHandler, TargetResult};
pub use errors::DatasourceError;
pub use telemetry::init_logging;

pub use dashboard_observer;
pub use pcp_core_types;
