use serde::{Deserialize, Serialize};

/// One structured piece of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Text {
        content: String,
    },
    /// A mention of another participant (or of the bot itself).
    At {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// Any element kind murmur does not understand (faces, files, cards...).
    #[serde(other)]
    Unsupported,
}

impl Element {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn at(id: impl Into<String>, name: Option<&str>) -> Self {
        Self::At {
            id: Some(id.into()),
            name: name.map(str::to_string),
        }
    }

    /// Platform-neutral markup for this element, as it would appear in a
    /// session's raw `content`.
    pub fn markup(&self) -> String {
        match self {
            Self::Text { content } => content.clone(),
            Self::At { id, name } => {
                let mut out = String::from("<at");
                if let Some(id) = id {
                    out.push_str(&format!(" id=\"{id}\""));
                }
                if let Some(name) = name {
                    out.push_str(&format!(" name=\"{name}\""));
                }
                out.push_str("/>");
                out
            },
            Self::Image { url } => match url {
                Some(url) => format!("<img src=\"{url}\"/>"),
                None => "<img/>".to_string(),
            },
            Self::Unsupported => String::new(),
        }
    }
}

/// Render a sequence of elements back into raw markup text.
pub fn markup_of(elements: &[Element]) -> String {
    elements.iter().map(Element::markup).collect()
}

/// The sender of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Per-group nickname, if the platform has one.
    pub nick: Option<String>,
}

impl Author {
    /// Name shown for this author: account name, then nickname, then `""`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.nick.as_deref())
            .unwrap_or_default()
    }
}

/// The bot account the session belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotIdentity {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// The message a session replies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotedMessage {
    pub author: Author,
    pub content: String,
    pub elements: Vec<Element>,
}

/// A single message event handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSession {
    /// Platform identifier (e.g. "telegram", "onebot").
    pub channel_type: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    /// True for one-to-one conversations.
    pub is_direct: bool,
    pub author: Author,
    /// Raw text of the message, markup included.
    pub content: String,
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuotedMessage>,
    pub bot: BotIdentity,
}

impl ChannelSession {
    /// Key under which this session's group history is kept: the guild when
    /// the platform has one, otherwise the channel. `None` for direct
    /// conversations and sessions without any identifier.
    pub fn group_id(&self) -> Option<&str> {
        if self.is_direct {
            return None;
        }
        self.guild_id
            .as_deref()
            .or(Some(self.channel_id.as_str()))
            .filter(|id| !id.is_empty())
    }

    /// Returns true if any element mentions `id`.
    pub fn mentions(&self, id: &str) -> bool {
        self.elements
            .iter()
            .any(|el| matches!(el, Element::At { id: Some(at), .. } if at == id))
    }

    /// Returns true if this message quotes something the bot said.
    pub fn quotes_bot(&self) -> bool {
        match (&self.quote, &self.bot.id) {
            (Some(quote), Some(bot_id)) => quote.author.id.as_deref() == Some(bot_id.as_str()),
            _ => false,
        }
    }
}
