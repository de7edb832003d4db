use std::sync::Arc;

use pcp_core_types::PcpError;

/// Hooks the owning datasource installs to react to target transitions.
///
/// Both hooks run synchronously on the thread driving `observe`/`cleanup`,
/// after the index has been updated and with no index lock held. Owners that
/// need async teardown should hand the work off (e.g. spawn or enqueue) and
/// return immediately. An `Err` is reported back in the cycle's stats; it
/// does not undo the transition and does not stop the rest of the cycle.
pub trait TargetListener<T>: Send + Sync {
    fn on_target_update(&self, previous: &T, current: &T) -> Result<(), PcpError>;
    fn on_target_inactive(&self, target: &T) -> Result<(), PcpError>;
}

/// Listener used until the owner registers one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl<T> TargetListener<T> for NoopListener {
    fn on_target_update(&self, _previous: &T, _current: &T) -> Result<(), PcpError> {
        Ok(())
    }

    fn on_target_inactive(&self, _target: &T) -> Result<(), PcpError> {
        Ok(())
    }
}

impl<T, L> TargetListener<T> for Arc<L>
where
    L: TargetListener<T> + ?Sized,
{
    fn on_target_update(&self, previous: &T, current: &T) -> Result<(), PcpError> {
        (**self).on_target_update(previous, current)
    }

    fn on_target_inactive(&self, target: &T) -> Result<(), PcpError> {
        (**self).on_target_inactive(target)
    }
}
