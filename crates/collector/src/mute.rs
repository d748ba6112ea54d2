//! Mute windows.
//!
//! A muted group still records history; it just never dispatches.

use std::time::Duration;

use crate::store::GroupState;

/// Start a mute window of `duration` from `now_ms`, or push the end of an
/// active window out by `duration`. Returns the new mute-until timestamp.
pub fn extend_mute(state: &mut GroupState, now_ms: u64, duration: Duration) -> u64 {
    let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    let base = if state.mute_until > now_ms {
        state.mute_until
    } else {
        now_ms
    };
    state.mute_until = base.saturating_add(duration_ms);
    state.mute_until
}

/// Returns true while the mute window has not yet ended.
pub fn is_muted(state: &GroupState, now_ms: u64) -> bool {
    state.mute_until > now_ms
}
