use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use pcp_core_types::{PcpError, TargetKey};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::{ObserverErrKind, ObserverError};
use crate::key::TrackedTarget;
use crate::listener::{NoopListener, TargetListener};
use crate::metrics::{ObserverMetrics, ObserverMetricsSnapshot};
use crate::model::{CallbackFailure, CallbackKind, ObserveStats, SnapshotEntry};
use crate::policy::ObserverPolicy;
use crate::store::{Sighting, SnapshotIndex};

pub struct DashboardObserverBuilder<T>
where
    T: TrackedTarget,
{
    policy: ObserverPolicy,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn TargetListener<T>>,
}

impl<T> DashboardObserverBuilder<T>
where
    T: TrackedTarget,
{
    pub fn new(policy: ObserverPolicy) -> Self {
        Self {
            policy,
            clock: Arc::new(SystemClock),
            listener: Arc::new(NoopListener),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: TargetListener<T> + 'static,
    {
        self.listener = Arc::new(listener);
        self
    }

    pub fn build(self) -> Result<Arc<DashboardObserver<T>>, ObserverError> {
        self.policy.validate()?;
        Ok(Arc::new(DashboardObserver {
            policy: self.policy,
            clock: self.clock,
            listener: RwLock::new(self.listener),
            index: SnapshotIndex::default(),
            metrics: ObserverMetrics::default(),
            background: Mutex::new(None),
        }))
    }
}

/// Tracks which targets a dashboard keeps asking for.
///
/// `observe` is fed every query batch and reports definition changes of
/// already known targets; `cleanup` evicts targets that have not been seen
/// for longer than the inactivity timeout. Both are synchronous and safe to
/// call from several threads at once.
pub struct DashboardObserver<T>
where
    T: TrackedTarget,
{
    pub(crate) policy: ObserverPolicy,
    pub(crate) clock: Arc<dyn Clock>,
    listener: RwLock<Arc<dyn TargetListener<T>>>,
    pub(crate) index: SnapshotIndex<T>,
    pub(crate) metrics: ObserverMetrics,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl<T> DashboardObserver<T>
where
    T: TrackedTarget,
{
    pub fn builder(policy: ObserverPolicy) -> DashboardObserverBuilder<T> {
        DashboardObserverBuilder::new(policy)
    }

    pub fn set_listener<L>(&self, listener: L)
    where
        L: TargetListener<T> + 'static,
    {
        *self.listener.write() = Arc::new(listener);
    }

    pub(crate) fn listener(&self) -> Arc<dyn TargetListener<T>> {
        Arc::clone(&self.listener.read())
    }

    pub fn policy(&self) -> &ObserverPolicy {
        &self.policy
    }

    pub fn observe(&self, batch: &[T]) -> ObserveStats {
        self.observe_at(batch, self.clock.now())
    }

    pub fn observe_at(&self, batch: &[T], now: DateTime<Utc>) -> ObserveStats {
        let mut stats = ObserveStats::default();
        if batch.is_empty() {
            return stats;
        }

        let listener = self.listener();
        for target in batch {
            let key = target.target_key();
            stats.seen += 1;
            match self.index.record(key.clone(), target, now) {
                Sighting::Added => {
                    stats.added += 1;
                    debug!(key = %key, "tracking new target");
                }
                Sighting::Unchanged => {
                    stats.unchanged += 1;
                }
                Sighting::Updated { previous } => {
                    stats.updated += 1;
                    debug!(key = %key, "target definition changed");
                    if let Err(err) = listener.on_target_update(&previous, target) {
                        stats
                            .failures
                            .push(self.callback_failed(CallbackKind::Update, key, err));
                    }
                }
            }
        }

        self.metrics
            .record_observe(stats.seen, stats.added, stats.updated);
        stats
    }

    pub(crate) fn callback_failed(
        &self,
        kind: CallbackKind,
        key: TargetKey,
        err: PcpError,
    ) -> CallbackFailure {
        warn!(key = %key, ?kind, error = %err, "target listener failed");
        self.metrics.record_callback_failure();
        CallbackFailure {
            kind,
            error: ObserverErrKind::Listener {
                key,
                reason: err.to_string(),
            }
            .into(),
        }
    }

    pub fn entry(&self, key: &TargetKey) -> Option<SnapshotEntry<T>> {
        self.index.get(key)
    }

    pub fn is_tracked(&self, target: &T) -> bool {
        self.index.contains(&target.target_key())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Forgets every target without notifying the listener.
    pub fn reset(&self) {
        self.index.clear();
    }

    pub fn metrics(&self) -> ObserverMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Spawns the periodic sweep on the current tokio runtime. Returns false
    /// when the policy has no sweep interval or a sweep task already runs.
    pub fn start_background_sweep(self: &Arc<Self>) -> bool {
        let Some(period) = self.policy.sweep_interval() else {
            return false;
        };
        let mut guard = self.background.lock();
        if guard.is_some() {
            return false;
        }
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick resolves immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(observer) = weak.upgrade() else {
                    break;
                };
                observer.cleanup();
            }
        });
        *guard = Some(handle);
        true
    }

    pub fn stop_background_sweep(&self) {
        if let Some(handle) = self.background.lock().take() {
            handle.abort();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.background.lock().is_some()
    }
}

impl<T> Drop for DashboardObserver<T>
where
    T: TrackedTarget,
{
    fn drop(&mut self) {
        if let Some(handle) = self.background.get_mut().take() {
            handle.abort();
        }
    }
}
