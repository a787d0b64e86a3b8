//! Command grammar for mention bodies.
//!
//! A body starting with `!` names a command by its first token; anything
//! else is an implicit `!rustc`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Evaluate a snippet on the playground.
    Rustc(&'a str),
    Crate(&'a str),
    Doc(&'a str),
    Example(&'a str),
    Unrecognized(&'a str),
}

impl<'a> Command<'a> {
    /// Parses a trimmed, unescaped body. Blank input yields `None`.
    #[must_use]
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let Some(rest) = text.strip_prefix('!') else {
            return Some(Command::Rustc(text));
        };

        let end = rest
            .find(|c: char| c.is_whitespace() || c == ':')
            .unwrap_or(rest.len());
        let (keyword, args) = rest.split_at(end);
        let args = args.strip_prefix(':').unwrap_or(args).trim_start();

        Some(match keyword {
            "rustc" => Command::Rustc(args.trim_end()),
            "crate" => Command::Crate(args),
            "doc" => Command::Doc(args),
            "example" => Command::Example(args),
            other => Command::Unrecognized(other),
        })
    }
}
