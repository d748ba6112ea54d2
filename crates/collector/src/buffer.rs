//! Bounded append for group history.

use crate::{lock::GroupGuard, message::Message};

/// Push `message` onto the guarded group's history, then drop the oldest
/// entries until at most `max_messages` remain. Returns how many were
/// evicted.
///
/// Taking the guard means this can only run inside the group's critical
/// section. Callers skip it entirely for messages whose normalized content
/// is empty.
pub fn append(guard: &GroupGuard, message: Message, max_messages: usize) -> usize {
    let mut state = guard.state();
    state.buffer.push_back(message);
    let overflow = state.buffer.len().saturating_sub(max_messages);
    state.buffer.drain(..overflow);
    overflow
}
