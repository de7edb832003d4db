use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::key::TrackedTarget;
use crate::model::{CallbackKind, SweepStats};
use crate::observer::DashboardObserver;

impl<T> DashboardObserver<T>
where
    T: TrackedTarget,
{
    /// Evicts targets idle for longer than the policy's inactivity timeout.
    pub fn cleanup(&self) -> SweepStats {
        self.cleanup_at(self.clock.now(), self.policy.inactivity_timeout())
    }

    /// Evicts every target whose last sighting is strictly more than
    /// `inactivity_timeout` before `now`, notifying the listener once per
    /// evicted target.
    pub fn cleanup_at(&self, now: DateTime<Utc>, inactivity_timeout: Duration) -> SweepStats {
        let scanned = self.index.len();
        let evicted = self.index.evict_stale(now, inactivity_timeout);
        let mut stats = SweepStats {
            scanned,
            evicted: evicted.len(),
            failures: Vec::new(),
        };

        if !evicted.is_empty() {
            let listener = self.listener();
            for entry in evicted {
                if let Err(err) = listener.on_target_inactive(&entry.last_target) {
                    stats
                        .failures
                        .push(self.callback_failed(CallbackKind::Inactive, entry.key, err));
                }
            }
            info!(
                evicted = stats.evicted,
                remaining = self.index.len(),
                timeout_ms = inactivity_timeout.as_millis() as u64,
                "evicted inactive targets"
            );
        }

        self.metrics.record_sweep(stats.evicted);
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pcp_core_types::DashboardTarget;

    use crate::clock::ManualClock;
    use crate::model::CallbackKind;
    use crate::observer::tests::{at, observer, target, Event, Recorder};
    use crate::observer::DashboardObserver;
    use crate::policy::ObserverPolicy;

    #[test]
    fn not_yet_expired_at_nineteen_seconds() {
        let recorder = Arc::new(Recorder::default());
        let (observer, clock) = observer(&recorder);
        clock.advance_to(0);
        observer.observe(&[target("A", "a")]);

        clock.advance_to(19_000);
        let stats = observer.cleanup();
        assert_eq!(stats.evicted, 0);
        assert_eq!(stats.scanned, 1);
        assert_eq!(recorder.inactive(), 0);
    }

    #[test]
    fn expired_at_twenty_one_seconds_fires_once() {
        let recorder = Arc::new(Recorder::default());
        let (observer, clock) = observer(&recorder);
        observer.observe(&[target("A", "a")]);

        clock.advance_to(21_000);
        assert_eq!(observer.cleanup().evicted, 1);
        assert_eq!(recorder.events(), vec![Event::Inactive(target("A", "a"))]);
        assert!(observer.is_empty());

        clock.advance_to(600_000);
        assert_eq!(observer.cleanup().evicted, 0);
        assert_eq!(recorder.inactive(), 1);
    }

    #[test]
    fn exactly_at_timeout_is_kept() {
        let recorder = Arc::new(Recorder::default());
        let (observer, _) = observer(&recorder);
        observer.observe_at(&[target("A", "a")], at(0));

        let timeout = Duration::from_secs(20);
        assert_eq!(observer.cleanup_at(at(20_000), timeout).evicted, 0);
        assert_eq!(observer.cleanup_at(at(20_001), timeout).evicted, 1);
    }

    #[test]
    fn evicted_payload_is_the_last_definition() {
        let recorder = Arc::new(Recorder::default());
        let (observer, clock) = observer(&recorder);
        observer.observe(&[target("A", "v1")]);
        observer.observe(&[target("A", "v2")]);

        clock.advance_to(30_000);
        observer.cleanup();
        assert_eq!(
            recorder.events().last(),
            Some(&Event::Inactive(target("A", "v2")))
        );
    }

    #[test]
    fn only_stale_targets_are_evicted() {
        let recorder = Arc::new(Recorder::default());
        let (observer, clock) = observer(&recorder);
        observer.observe(&[target("A", "a"), target("B", "b"), target("C", "c")]);
        clock.advance_to(15_000);
        observer.observe(&[target("B", "b")]);

        clock.advance_to(25_000);
        let stats = observer.cleanup();
        assert_eq!(stats.evicted, 2);
        assert_eq!(observer.len(), 1);
        assert!(observer.is_tracked(&target("B", "b")));

        let mut gone: Vec<String> = recorder
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Inactive(target) => Some(target.target.ref_id),
                Event::Update(..) => None,
            })
            .collect();
        gone.sort();
        assert_eq!(gone, vec!["A", "C"]);
    }

    #[test]
    fn evicted_target_returns_as_new() {
        let recorder = Arc::new(Recorder::default());
        let (observer, clock) = observer(&recorder);
        observer.observe(&[target("A", "a")]);
        clock.advance_to(21_000);
        observer.cleanup();

        let stats = observer.observe(&[target("A", "changed")]);
        assert_eq!(stats.added, 1);
        assert_eq!(recorder.updates(), 0);
    }

    #[test]
    fn failing_inactive_hook_still_evicts() {
        let recorder = Arc::new(Recorder::failing());
        let (observer, clock) = observer(&recorder);
        observer.observe(&[target("A", "a")]);
        clock.advance_to(21_000);

        let stats = observer.cleanup();
        assert_eq!(stats.evicted, 1);
        assert_eq!(stats.failures.len(), 1);
        assert_eq!(stats.failures[0].kind, CallbackKind::Inactive);
        assert!(observer.is_empty());
        assert_eq!(observer.metrics().evicted, 1);
    }

    #[test]
    fn concurrent_sweeps_fire_each_target_once() {
        let recorder = Arc::new(Recorder::default());
        let (observer, _) = observer(&recorder);
        let batch: Vec<DashboardTarget> = (0..64)
            .map(|idx| target(&format!("T{idx}"), "expr"))
            .collect();
        observer.observe_at(&batch, at(0));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let observer = &observer;
                scope.spawn(move || {
                    observer.cleanup_at(at(60_000), Duration::from_secs(20));
                });
            }
        });

        assert_eq!(recorder.inactive(), 64);
        assert!(observer.is_empty());
        assert_eq!(observer.metrics().evicted, 64);
    }

    #[test]
    fn concurrent_refresh_and_sweep_never_double_fire() {
        let recorder = Arc::new(Recorder::default());
        let (observer, _) = observer(&recorder);
        let batch: Vec<DashboardTarget> = (0..32)
            .map(|idx| target(&format!("T{idx}"), "expr"))
            .collect();
        observer.observe_at(&batch, at(0));

        std::thread::scope(|scope| {
            let refresher = &observer;
            let refreshed = &batch;
            scope.spawn(move || {
                refresher.observe_at(refreshed, at(60_000));
            });
            let sweeper = &observer;
            scope.spawn(move || {
                sweeper.cleanup_at(at(60_000), Duration::from_secs(20));
            });
        });

        // Every target is either still tracked (refreshed first) or was
        // evicted exactly once and re-added by the refresh.
        assert_eq!(observer.len(), 32);
        assert!(recorder.inactive() <= 32);
        assert_eq!(recorder.updates(), 0);
        let evicted_again = observer.cleanup_at(at(60_000), Duration::from_secs(20));
        assert_eq!(evicted_again.evicted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_evicts_on_its_own() {
        let recorder = Arc::new(Recorder::default());
        let clock = Arc::new(ManualClock::default());
        let policy = ObserverPolicy {
            inactivity_timeout_ms: 20_000,
            sweep_interval_ms: 1_000,
        };
        let observer: Arc<DashboardObserver<DashboardTarget>> = DashboardObserver::builder(policy)
            .with_clock(clock.clone())
            .with_listener(Arc::clone(&recorder))
            .build()
            .unwrap();
        observer.observe(&[target("A", "a")]);

        assert!(observer.start_background_sweep());
        assert!(!observer.start_background_sweep());
        assert!(observer.is_sweeping());

        clock.advance_to(21_000);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(recorder.inactive(), 1);

        observer.stop_background_sweep();
        assert!(!observer.is_sweeping());
    }

    #[tokio::test]
    async fn manual_policy_has_no_background_sweep() {
        let recorder = Arc::new(Recorder::default());
        let (observer, _) = observer(&recorder);
        assert!(!observer.start_background_sweep());
        assert!(!observer.is_sweeping());
    }
}
