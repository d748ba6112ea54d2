//! Per-group critical sections.
//!
//! Each group owns a tokio mutex. Waiters are woken in the order they
//! started waiting, so two messages racing for one group are recorded in
//! lock-request order. Holding a [`GroupGuard`] is the "in critical
//! section" state; dropping it releases the group on every exit path.

use std::{
    sync::{Arc, MutexGuard},
    time::Duration,
};

use {tokio::sync::OwnedMutexGuard, tracing::trace};

use crate::{
    error::{Error, Result},
    store::{GroupSlot, GroupState},
};

/// Proof that the holder is inside a group's critical section.
pub struct GroupGuard {
    group_id: String,
    slot: Arc<GroupSlot>,
    _section: OwnedMutexGuard<()>,
}

impl GroupGuard {
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Access the group's data. Do not hold the returned guard across `.await`.
    pub fn state(&self) -> MutexGuard<'_, GroupState> {
        self.slot.state()
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        trace!(group_id = %self.group_id, "group lock released");
    }
}

impl std::fmt::Debug for GroupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupGuard")
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

/// Enter the group's critical section, waiting for any current holder.
///
/// With `timeout = None` this waits forever; a holder that never finishes
/// stalls the group. With a timeout, giving up yields
/// [`Error::LockTimeout`] and leaves the current holder untouched.
///
/// Re-entering the same group from inside its own critical section
/// deadlocks (or times out).
pub async fn acquire(
    group_id: &str,
    slot: Arc<GroupSlot>,
    timeout: Option<Duration>,
) -> Result<GroupGuard> {
    let section = Arc::clone(&slot.section);
    let guard = match timeout {
        None => section.lock_owned().await,
        Some(limit) => tokio::time::timeout(limit, section.lock_owned())
            .await
            .map_err(|_| Error::lock_timeout(group_id, limit))?,
    };
    trace!(group_id, "group lock acquired");
    Ok(GroupGuard {
        group_id: group_id.to_string(),
        slot,
        _section: guard,
    })
}
