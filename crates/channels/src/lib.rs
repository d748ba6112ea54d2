//! Host-facing channel model.
//!
//! The chat platform adapter (transport, bot login, guild lookups) lives
//! outside murmur. It hands every inbound or outbound message over as a
//! [`ChannelSession`]: who sent it, where, the raw text, the structured
//! elements and the bot's own identity.

pub mod gating;
pub mod session;

pub use session::{Author, BotIdentity, ChannelSession, Element, QuotedMessage};
