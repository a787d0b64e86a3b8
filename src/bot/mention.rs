//! Mention detection and Slack text cleanup.

use crate::core::models::BotIdentity;

/// Reverses Slack's HTML entity escaping in a single pass.
///
/// Slack itself only emits `&amp;`, `&lt;` and `&gt;`; the other common
/// named entities and numeric references are decoded as well. Unknown
/// entities are left as they are.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            decode_entity(entity).map(|c| (c, end + 1))
        });

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Returns the command text when `text` addresses the bot.
///
/// A mention is either the `<@ID>` token or the bot's display name at the
/// very start. The first whitespace-separated token is dropped; a message
/// with nothing after it yields `None`.
#[must_use]
pub fn strip_mention<'a>(text: &'a str, identity: &BotIdentity) -> Option<&'a str> {
    let mention = format!("<@{}>", identity.id);
    let addressed = text.starts_with(&mention)
        || (!identity.display_name.is_empty() && text.starts_with(&identity.display_name));
    if !addressed {
        return None;
    }

    let (_, rest) = text.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    (!rest.is_empty()).then_some(rest)
}
