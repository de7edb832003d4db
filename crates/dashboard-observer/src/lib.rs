//! Dashboard target lifecycle tracking.
//!
//! A datasource feeds every query batch into [`DashboardObserver::observe`],
//! which remembers the last definition and sighting time of each target and
//! reports definition changes to the registered [`TargetListener`]. A sweep
//! ([`DashboardObserver::cleanup`], run by the owner or by the background
//! task) evicts targets the dashboard stopped asking for.

pub mod clock;
pub mod errors;
pub mod key;
pub mod listener;
pub mod metrics;
pub mod model;
pub mod observer;
pub mod policy;
pub mod store;
mod sweep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ObserverErrKind, ObserverError};
pub use key::{derive_key, TrackedTarget};
pub use listener::{NoopListener, TargetListener};
pub use metrics::ObserverMetricsSnapshot;
pub use model::{CallbackFailure, CallbackKind, ObserveStats, SnapshotEntry, SweepStats};
pub use observer::{DashboardObserver, DashboardObserverBuilder};
pub use policy::ObserverPolicy;
