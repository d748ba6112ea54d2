//! Config schema types.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MurmurConfig {
    pub collector: CollectorConfig,
    pub filters: FilterConfig,
}

/// Buffering and locking behaviour of the group collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum number of messages kept per group; oldest are evicted first.
    pub max_messages: usize,

    /// How long a broadcast waits for its group's lock before giving up (ms).
    /// `0` waits forever.
    pub lock_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_messages: 40,
            lock_timeout_ms: 0,
        }
    }
}

/// Mention activation mode for group chats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MentionMode {
    /// Dispatch only when the bot is mentioned or quoted.
    #[default]
    Mention,
    /// Dispatch on every buffered message.
    Always,
    /// Never dispatch from the built-in mention filter.
    None,
}

/// Built-in dispatch filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub mention_mode: MentionMode,

    /// Case-insensitive substrings that make a message eligible for dispatch.
    pub keywords: Vec<String>,

    /// Group ids (glob patterns) allowed to dispatch. Empty allows all.
    pub group_allowlist: Vec<String>,

    /// Sender ids (glob patterns) allowed to trigger dispatch. Empty allows all.
    pub sender_allowlist: Vec<String>,
}
