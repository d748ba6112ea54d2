//! Metric names recorded when the `metrics` feature is enabled.

/// Messages appended to a group history
pub const MESSAGES_BUFFERED_TOTAL: &str = "murmur_collector_messages_buffered_total";
/// Messages dropped because their normalized content was empty
pub const MESSAGES_EMPTY_TOTAL: &str = "murmur_collector_messages_empty_total";
/// Messages evicted to respect the per-group capacity
pub const MESSAGES_EVICTED_TOTAL: &str = "murmur_collector_messages_evicted_total";
/// Dispatches delivered to subscribers
pub const DISPATCHES_TOTAL: &str = "murmur_collector_dispatches_total";
/// Dispatches suppressed by an active mute window
pub const DISPATCHES_MUTED_TOTAL: &str = "murmur_collector_dispatches_muted_total";
/// Subscriber runs that returned an error or panicked
pub const SUBSCRIBER_FAILURES_TOTAL: &str = "murmur_collector_subscriber_failures_total";
/// Lock acquisitions that gave up after the configured timeout
pub const LOCK_TIMEOUTS_TOTAL: &str = "murmur_collector_lock_timeouts_total";
/// Number of groups with state in memory
pub const GROUPS_TRACKED: &str = "murmur_collector_groups_tracked";
