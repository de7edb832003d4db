use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pcp_core_types::TargetKey;

use crate::model::SnapshotEntry;

/// What a single sighting did to the index.
#[derive(Clone, Debug, PartialEq)]
pub enum Sighting<T> {
    Added,
    Unchanged,
    Updated { previous: T },
}

/// Key -> last sighting. Every read-modify-write goes through the shard lock
/// of its key, so a sighting and an eviction of the same key never interleave.
pub struct SnapshotIndex<T> {
    entries: DashMap<TargetKey, SnapshotEntry<T>>,
}

impl<T> Default for SnapshotIndex<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> SnapshotIndex<T>
where
    T: Clone + PartialEq,
{
    pub fn record(&self, key: TargetKey, target: &T, now: DateTime<Utc>) -> Sighting<T> {
        match self.entries.entry(key) {
            Entry::Occupied(mut occ) => {
                let entry = occ.get_mut();
                entry.last_seen_at = now;
                if entry.last_target == *target {
                    Sighting::Unchanged
                } else {
                    let previous = std::mem::replace(&mut entry.last_target, target.clone());
                    Sighting::Updated { previous }
                }
            }
            Entry::Vacant(vac) => {
                let key = vac.key().clone();
                vac.insert(SnapshotEntry {
                    key,
                    last_target: target.clone(),
                    last_seen_at: now,
                });
                Sighting::Added
            }
        }
    }

    /// Removes every entry idle for strictly longer than `timeout`.
    pub fn evict_stale(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<SnapshotEntry<T>> {
        // Iteration holds shard read locks; collect first, remove after.
        let candidates: Vec<TargetKey> = self
            .entries
            .iter()
            .filter(|entry| is_stale(entry.value(), now, timeout))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter_map(|key| {
                self.entries
                    .remove_if(&key, |_, entry| is_stale(entry, now, timeout))
                    .map(|(_, entry)| entry)
            })
            .collect()
    }

    pub fn get(&self, key: &TargetKey) -> Option<SnapshotEntry<T>> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    pub fn contains(&self, key: &TargetKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

fn is_stale<T>(entry: &SnapshotEntry<T>, now: DateTime<Utc>, timeout: Duration) -> bool {
    // A negative elapsed time (clock stepped back) never counts as idle.
    match now.signed_duration_since(entry.last_seen_at).to_std() {
        Ok(idle) => idle > timeout,
        Err(_) => false,
    }
}
