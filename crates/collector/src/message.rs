use serde::{Deserialize, Serialize};

/// Id used when the platform does not tell us who sent something.
pub const UNKNOWN_ID: &str = "0";

/// A normalized chat message as kept in a group's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Flattened text; mentions appear as `(name-id-<at>)`.
    pub content: String,
    pub name: String,
    pub id: String,
    /// Snapshot of the message this one replies to. Never nested further.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Box<Message>>,
}

impl Message {
    pub fn new(content: impl Into<String>, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: name.into(),
            id: id.into(),
            quote: None,
        }
    }

    #[must_use]
    pub fn with_quote(mut self, quote: Message) -> Self {
        self.quote = Some(Box::new(Message {
            quote: None,
            ..quote
        }));
        self
    }
}

/// Auxiliary per-group data owned by higher-level features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTemp {
    /// Messages queued by a completion feature for this group.
    pub completion_messages: Vec<Message>,
    /// Free-form values keyed by feature name.
    pub values: serde_json::Map<String, serde_json::Value>,
}
