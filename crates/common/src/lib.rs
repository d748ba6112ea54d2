//! Shared error plumbing and the time source used across murmur crates.

pub mod clock;
pub mod error;

pub use {
    clock::{Clock, ManualClock, SystemClock},
    error::FromMessage,
};
