//! Flattening of mixed text/mention content into one canonical string.

use murmur_channels::{BotIdentity, Element};

use crate::message::UNKNOWN_ID;

/// Flatten a message into the string kept in group history.
///
/// Returns `""` when `raw` has nothing but trailing whitespace, whatever the
/// elements say; callers treat that as "nothing worth recording". Otherwise
/// text elements are concatenated with their trailing whitespace removed
/// (blank ones contribute nothing) and mentions become `(name-id-<at>)`.
/// Every other element kind is dropped.
pub fn normalize(bot: &BotIdentity, raw: &str, elements: &[Element]) -> String {
    if raw.trim_end().is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for element in elements {
        match element {
            Element::Text { content } => out.push_str(content.trim_end()),
            Element::At { id, name } => {
                let id = id.as_deref();
                let name = mention_name(bot, id, name.as_deref());
                out.push('(');
                out.push_str(name);
                out.push('-');
                out.push_str(id.unwrap_or(UNKNOWN_ID));
                out.push_str("-<at>)");
            },
            Element::Image { .. } | Element::Unsupported => {},
        }
    }
    out
}

fn mention_name<'a>(bot: &'a BotIdentity, id: Option<&'a str>, name: Option<&'a str>) -> &'a str {
    if let Some(name) = name {
        return name;
    }
    let is_self = id.is_some() && id == bot.id.as_deref();
    if is_self {
        bot.name.as_deref().unwrap_or(UNKNOWN_ID)
    } else {
        id.unwrap_or(UNKNOWN_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> BotIdentity {
        BotIdentity {
            id: Some("999".into()),
            name: Some("Assistant".into()),
        }
    }

    #[test]
    fn whitespace_only_raw_is_empty() {
        assert_eq!(normalize(&bot(), "  ", &[Element::text("  ")]), "");
        // Elements are not consulted at all.
        assert_eq!(normalize(&bot(), "\n\t", &[Element::at("42", Some("Bob"))]), "");
    }

    #[test]
    fn text_and_named_mention() {
        let elements = [Element::text("hello"), Element::at("42", Some("Bob"))];
        assert_eq!(normalize(&bot(), "hello", &elements), "hello(Bob-42-<at>)");
    }

    #[test]
    fn self_mention_uses_bot_name() {
        let elements = [Element::at("999", None)];
        assert_eq!(
            normalize(&bot(), "<at id=\"999\"/>", &elements),
            "(Assistant-999-<at>)"
        );
    }

    #[test]
    fn self_mention_without_bot_name() {
        let bot = BotIdentity {
            id: Some("999".into()),
            name: None,
        };
        assert_eq!(
            normalize(&bot, "x", &[Element::at("999", None)]),
            "(0-999-<at>)"
        );
    }

    #[test]
    fn other_mention_without_name_uses_id() {
        assert_eq!(
            normalize(&bot(), "x", &[Element::at("42", None)]),
            "(42-42-<at>)"
        );
        let anonymous = Element::At {
            id: None,
            name: None,
        };
        assert_eq!(normalize(&bot(), "x", &[anonymous]), "(0-0-<at>)");
    }

    #[test]
    fn explicit_name_wins_over_bot_name() {
        assert_eq!(
            normalize(&bot(), "x", &[Element::at("999", Some("Helper"))]),
            "(Helper-999-<at>)"
        );
    }

    #[test]
    fn blank_text_skipped_and_trailing_whitespace_trimmed() {
        let elements = [
            Element::text("hi  "),
            Element::text("   "),
            Element::Image { url: None },
            Element::text(" there\n"),
            Element::Unsupported,
        ];
        assert_eq!(normalize(&bot(), "hi there", &elements), "hi there");
    }

    #[test]
    fn non_blank_raw_with_only_images_is_empty() {
        let elements = [Element::Image {
            url: Some("https://example.com/cat.png".into()),
        }];
        assert_eq!(normalize(&bot(), "<img/>", &elements), "");
    }
}
