use std::fmt;

use blake3::Hasher;
use pcp_core_types::{DashboardTarget, TargetKey};

/// A target the observer can track: value-comparable, with a stable identity.
///
/// `PartialEq` decides whether a re-sighted target counts as an update;
/// `target_key` decides whether it is the same target at all. Implementations
/// must keep the key independent of fields that only change the payload.
pub trait TrackedTarget: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn target_key(&self) -> TargetKey;
}

impl TrackedTarget for DashboardTarget {
    fn target_key(&self) -> TargetKey {
        derive_key(self)
    }
}

/// Identity is the panel slot (dashboard, panel, refId) plus the endpoint the
/// expression is evaluated against. Expression, format, legend and visibility
/// are payload.
pub fn derive_key(target: &DashboardTarget) -> TargetKey {
    let mut hasher = Hasher::new();
    absorb_str(&mut hasher, target.dashboard_uid.as_deref());
    absorb_u64(&mut hasher, target.panel_id);
    absorb_str(&mut hasher, Some(target.target.ref_id.as_str()));
    absorb_str(&mut hasher, target.target.url.as_deref());
    absorb_str(&mut hasher, target.target.hostspec.as_deref());
    TargetKey(format!("tk_{}", hasher.finalize().to_hex()))
}

// Length-prefixed so adjacent fields cannot bleed into each other.
fn absorb_str(hasher: &mut Hasher, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update(&[1]);
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

fn absorb_u64(hasher: &mut Hasher, value: Option<u64>) {
    match value {
        Some(value) => {
            hasher.update(&[1]);
            hasher.update(&value.to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
