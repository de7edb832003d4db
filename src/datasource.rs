use std::sync::Arc;

use async_trait::async_trait;
use dashboard_observer::{Clock, DashboardObserver, ObserveStats, SystemClock, TargetListener};
use futures::future::join_all;
use pcp_core_types::{DashboardTarget, PcpError, Query, RequestId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DatasourceSettings;
use crate::errors::DatasourceError;

/// Result of evaluating one target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TargetResult {
    pub target: DashboardTarget,
    pub metrics: Vec<serde_json::Value>,
}

#[derive(Debug)]
pub struct QueryResponse {
    pub request_id: RequestId,
    pub results: Vec<TargetResult>,
    pub errors: Vec<DatasourceError>,
    pub observed: ObserveStats,
}

/// Evaluates a single target against the backend.
#[async_trait]
pub trait TargetHandler: Send + Sync + 'static {
    async fn handle_target(
        &self,
        query: &Query,
        target: &DashboardTarget,
    ) -> Result<TargetResult, PcpError>;
}

/// Shared part of every PCP datasource: turns each dashboard query into an
/// observe cycle, then evaluates the targets through the concrete handler.
///
/// The handler doubles as the default target listener, so a concrete
/// datasource reacts to edited and abandoned targets by implementing
/// [`TargetListener`] next to [`TargetHandler`].
pub struct DatasourceBase<H>
where
    H: TargetHandler + TargetListener<DashboardTarget>,
{
    settings: DatasourceSettings,
    handler: Arc<H>,
    observer: Arc<DashboardObserver<DashboardTarget>>,
}

impl<H> DatasourceBase<H>
where
    H: TargetHandler + TargetListener<DashboardTarget>,
{
    pub fn new(settings: DatasourceSettings, handler: H) -> Result<Self, DatasourceError> {
        Self::with_clock(settings, handler, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: DatasourceSettings,
        handler: H,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DatasourceError> {
        let handler = Arc::new(handler);
        let observer = DashboardObserver::builder(settings.observer_policy())
            .with_clock(clock)
            .with_listener(Arc::clone(&handler))
            .build()?;
        info!(
            url = %settings.url,
            inactivity_timeout_ms = observer.policy().inactivity_timeout_ms,
            sweep_interval_ms = observer.policy().sweep_interval_ms,
            "datasource initialised"
        );
        Ok(Self {
            settings,
            handler,
            observer,
        })
    }

    pub fn settings(&self) -> &DatasourceSettings {
        &self.settings
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn dashboard_observer(&self) -> &Arc<DashboardObserver<DashboardTarget>> {
        &self.observer
    }

    pub async fn query(&self, query: &Query) -> QueryResponse {
        let targets: Vec<DashboardTarget> = query
            .targets
            .iter()
            .filter(|target| !target.hide)
            .map(|target| DashboardTarget::scoped(query, target))
            .collect();

        let observed = self.observer.observe(&targets);
        if !observed.failures.is_empty() {
            warn!(
                request = %query.request_id.0,
                failures = observed.failures.len(),
                "target listener reported failures"
            );
        }
        debug!(
            request = %query.request_id.0,
            targets = targets.len(),
            added = observed.added,
            updated = observed.updated,
            "query observed"
        );

        let outcomes = join_all(
            targets
                .iter()
                .map(|target| self.handler.handle_target(query, target)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for (target, outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(
                        dashboard_target = %target,
                        error = %err,
                        "target evaluation failed"
                    );
                    errors.push(DatasourceError::Target {
                        ref_id: target.ref_id().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        QueryResponse {
            request_id: query.request_id.clone(),
            results,
            errors,
            observed,
        }
    }

    /// Starts the periodic inactivity sweep. Needs a tokio runtime; does
    /// nothing when the poll interval is zero or the sweep already runs.
    pub fn start(&self) -> bool {
        self.observer.start_background_sweep()
    }

    pub fn stop(&self) {
        self.observer.stop_background_sweep();
    }
}

impl<H> Drop for DatasourceBase<H>
where
    H: TargetHandler + TargetListener<DashboardTarget>,
{
    fn drop(&mut self) {
        self.observer.stop_background_sweep();
    }
}
