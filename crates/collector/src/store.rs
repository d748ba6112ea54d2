//! Per-group state, created lazily and kept for the life of the process.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use {dashmap::DashMap, tokio::sync::Mutex as AsyncMutex};

use crate::message::{GroupTemp, Message};

/// Mutable state of one group.
#[derive(Debug, Default)]
pub struct GroupState {
    /// Epoch milliseconds before which dispatch is suppressed. `0` = never muted.
    pub mute_until: u64,
    /// Oldest message first.
    pub buffer: VecDeque<Message>,
    pub temp: GroupTemp,
}

/// Everything the store keeps for one group.
///
/// `section` serializes whole critical sections (and may be held across
/// `.await`); `state` is a plain mutex that is only ever held for a few
/// synchronous statements, never across an `.await`.
#[derive(Debug, Default)]
pub struct GroupSlot {
    pub(crate) section: Arc<AsyncMutex<()>>,
    state: Mutex<GroupState>,
}

impl GroupSlot {
    /// Lock the group's data for a short synchronous read or update.
    pub fn state(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns true while a critical section is in progress for this group.
    pub fn is_locked(&self) -> bool {
        self.section.try_lock().is_err()
    }
}

/// Map from group id to that group's state.
#[derive(Debug, Default)]
pub struct GroupStateStore {
    groups: DashMap<String, Arc<GroupSlot>>,
}

impl GroupStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the group's slot, creating an empty one on first access.
    ///
    /// Lookup and insertion happen under the same shard lock, so concurrent
    /// first accesses for one id always observe the same slot.
    pub fn get_or_create(&self, group_id: &str) -> Arc<GroupSlot> {
        if let Some(slot) = self.groups.get(group_id) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .groups
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(GroupSlot::default()));
        Arc::clone(slot.value())
    }

    /// Return the group's slot without creating it.
    pub fn get(&self, group_id: &str) -> Option<Arc<GroupSlot>> {
        self.groups.get(group_id).map(|slot| Arc::clone(slot.value()))
    }

    /// Ids of every group seen so far, sorted.
    pub fn group_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
