//! Dispatch filters.
//!
//! A filter looks at the session and the freshly normalized message and
//! says whether this message should wake the subscribers. Filters are
//! combined with OR: any match makes the message eligible.

use std::sync::Arc;

use {
    murmur_channels::{ChannelSession, gating::is_allowed},
    murmur_config::{FilterConfig, MentionMode},
};

use crate::message::Message;

/// Pure predicate over an incoming message.
pub trait Filter: Send + Sync {
    fn matches(&self, session: &ChannelSession, message: &Message) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&ChannelSession, &Message) -> bool + Send + Sync,
{
    fn matches(&self, session: &ChannelSession, message: &Message) -> bool {
        self(session, message)
    }
}

/// Matches every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Filter for Always {
    fn matches(&self, _session: &ChannelSession, _message: &Message) -> bool {
        true
    }
}

/// Matches messages that mention the bot or reply to something it said.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionsBot;

impl Filter for MentionsBot {
    fn matches(&self, session: &ChannelSession, _message: &Message) -> bool {
        let mentioned = session
            .bot
            .id
            .as_deref()
            .is_some_and(|id| session.mentions(id));
        mentioned || session.quotes_bot()
    }
}

/// Matches when the normalized content contains any keyword (case-insensitive).
#[derive(Debug, Clone)]
pub struct Keywords {
    keywords: Vec<String>,
}

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl Filter for Keywords {
    fn matches(&self, _session: &ChannelSession, message: &Message) -> bool {
        let content = message.content.to_lowercase();
        self.keywords.iter().any(|k| content.contains(k.as_str()))
    }
}

/// Matches senders covered by a glob allowlist (empty allows all).
#[derive(Debug, Clone)]
pub struct SenderAllowlist(pub Vec<String>);

impl Filter for SenderAllowlist {
    fn matches(&self, _session: &ChannelSession, message: &Message) -> bool {
        is_allowed(&message.id, &self.0)
    }
}

/// Matches groups covered by a glob allowlist (empty allows all).
#[derive(Debug, Clone)]
pub struct GroupAllowlist(pub Vec<String>);

impl Filter for GroupAllowlist {
    fn matches(&self, session: &ChannelSession, _message: &Message) -> bool {
        session
            .group_id()
            .is_some_and(|group_id| is_allowed(group_id, &self.0))
    }
}

/// Matches only when every inner filter matches.
#[derive(Clone, Default)]
pub struct AllOf(pub Vec<Arc<dyn Filter>>);

impl Filter for AllOf {
    fn matches(&self, session: &ChannelSession, message: &Message) -> bool {
        self.0.iter().all(|f| f.matches(session, message))
    }
}

/// Build the filter set described by configuration.
///
/// The mention mode and keywords are triggers; the allowlists narrow every
/// trigger rather than acting as triggers of their own.
pub fn from_config(config: &FilterConfig) -> Vec<Arc<dyn Filter>> {
    let mut triggers: Vec<Arc<dyn Filter>> = Vec::new();
    match config.mention_mode {
        MentionMode::Always => triggers.push(Arc::new(Always)),
        MentionMode::Mention => triggers.push(Arc::new(MentionsBot)),
        MentionMode::None => {},
    }
    let keywords = Keywords::new(&config.keywords);
    if !keywords.keywords.is_empty() {
        triggers.push(Arc::new(keywords));
    }

    let mut restrictions: Vec<Arc<dyn Filter>> = Vec::new();
    if !config.group_allowlist.is_empty() {
        restrictions.push(Arc::new(GroupAllowlist(config.group_allowlist.clone())));
    }
    if !config.sender_allowlist.is_empty() {
        restrictions.push(Arc::new(SenderAllowlist(config.sender_allowlist.clone())));
    }
    if restrictions.is_empty() {
        return triggers;
    }

    triggers
        .into_iter()
        .map(|trigger| {
            let mut all = vec![trigger];
            all.extend(restrictions.iter().cloned());
            Arc::new(AllOf(all)) as Arc<dyn Filter>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        murmur_channels::{Author, BotIdentity, Element, QuotedMessage},
    };

    fn session(elements: Vec<Element>) -> ChannelSession {
        ChannelSession {
            guild_id: Some("g1".into()),
            channel_id: "c1".into(),
            elements,
            bot: BotIdentity {
                id: Some("bot".into()),
                name: Some("Assistant".into()),
            },
            ..Default::default()
        }
    }

    fn any_match(filters: &[Arc<dyn Filter>], session: &ChannelSession, message: &Message) -> bool {
        filters.iter().any(|f| f.matches(session, message))
    }

    #[test]
    fn closures_are_filters() {
        let long = |_: &ChannelSession, m: &Message| m.content.len() > 3;
        let s = session(vec![]);
        assert!(long.matches(&s, &Message::new("hello", "a", "1")));
        assert!(!long.matches(&s, &Message::new("hi", "a", "1")));
    }

    #[test]
    fn mentions_bot_by_at_or_quote() {
        let msg = Message::new("x", "alice", "1");
        assert!(MentionsBot.matches(&session(vec![Element::at("bot", None)]), &msg));
        assert!(!MentionsBot.matches(&session(vec![Element::at("other", None)]), &msg));

        let mut reply = session(vec![Element::text("sure?")]);
        reply.quote = Some(QuotedMessage {
            author: Author {
                id: Some("bot".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(MentionsBot.matches(&reply, &msg));
    }

    #[test]
    fn keywords_ignore_case_and_blanks() {
        let filter = Keywords::new(["Deploy", "  "]);
        let s = session(vec![]);
        assert!(filter.matches(&s, &Message::new("please DEPLOY now", "a", "1")));
        assert!(!filter.matches(&s, &Message::new("nothing here", "a", "1")));
    }

    #[test]
    fn allowlists() {
        let s = session(vec![]);
        let msg = Message::new("x", "admin", "admin_7");
        assert!(SenderAllowlist(vec!["admin_*".into()]).matches(&s, &msg));
        assert!(!SenderAllowlist(vec!["root".into()]).matches(&s, &msg));
        assert!(GroupAllowlist(vec!["g*".into()]).matches(&s, &msg));
        assert!(!GroupAllowlist(vec!["h*".into()]).matches(&s, &msg));
    }

    #[test]
    fn config_mention_mode_none_without_keywords_never_matches() {
        let config = FilterConfig {
            mention_mode: MentionMode::None,
            ..Default::default()
        };
        assert!(from_config(&config).is_empty());
    }

    #[test]
    fn config_allowlist_narrows_triggers() {
        let config = FilterConfig {
            mention_mode: MentionMode::Always,
            keywords: vec!["help".into()],
            sender_allowlist: vec!["trusted".into()],
            ..Default::default()
        };
        let filters = from_config(&config);
        assert_eq!(filters.len(), 2);

        let s = session(vec![]);
        assert!(any_match(&filters, &s, &Message::new("hi", "t", "trusted")));
        assert!(!any_match(&filters, &s, &Message::new("help", "x", "stranger")));
    }

    #[test]
    fn config_default_is_mention_only() {
        let filters = from_config(&FilterConfig::default());
        let msg = Message::new("x", "alice", "1");
        assert!(any_match(&filters, &session(vec![Element::at("bot", None)]), &msg));
        assert!(!any_match(&filters, &session(vec![]), &msg));
    }
}
