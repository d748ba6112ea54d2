//! Group message collector.
//!
//! Keeps a bounded history of recent messages per chat group, normalizes
//! mixed text/mention content into one string, honours a per-group mute
//! window, and hands the history to subscribers whenever a registered
//! filter matches a newly arrived message.
//!
//! Every mutation of a group's history happens inside that group's
//! critical section ([`GroupGuard`]); different groups never contend.

pub mod buffer;
pub mod collector;
pub mod error;
pub mod filters;
pub mod lock;
pub mod message;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod mute;
pub mod normalize;
pub mod store;
pub mod subscriber;

pub use {
    collector::{BroadcastOutcome, Collector, GroupStats},
    error::{Error, Result},
    filters::Filter,
    lock::GroupGuard,
    message::{GroupTemp, Message},
    normalize::normalize,
    store::GroupStateStore,
    subscriber::{Subscriber, subscriber_fn},
};
