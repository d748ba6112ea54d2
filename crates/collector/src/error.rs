use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The group's critical section stayed busy past the configured timeout.
    #[error("timed out after {waited:?} waiting for the lock of group {group_id}")]
    LockTimeout { group_id: String, waited: Duration },

    /// A subscriber returned an error or panicked while handling a dispatch.
    #[error("subscriber {name} failed: {message}")]
    Subscriber { name: String, message: String },
}

impl Error {
    #[must_use]
    pub fn lock_timeout(group_id: impl Into<String>, waited: Duration) -> Self {
        Self::LockTimeout {
            group_id: group_id.into(),
            waited,
        }
    }

    #[must_use]
    pub fn subscriber(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Subscriber {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
