//! Wraps user snippets into a complete program.
//!
//! Templates use `$snippet` or `${snippet}` as the placeholder; `$$` is a
//! literal dollar sign. Any other `$` is copied through untouched.

use crate::errors::BotError;

const PLACEHOLDER: &str = "snippet";

#[derive(Debug, Clone)]
pub struct SnippetTemplate {
    source: String,
}

impl SnippetTemplate {
    /// # Errors
    ///
    /// Returns `BotError::ConfigError` if the template has no `snippet`
    /// placeholder.
    pub fn new(source: impl Into<String>) -> Result<Self, BotError> {
        let source = source.into();
        let has_placeholder = scan(&source).any(|piece| matches!(piece, Piece::Placeholder));
        if !has_placeholder {
            return Err(BotError::ConfigError(format!(
                "template has no `${PLACEHOLDER}` placeholder"
            )));
        }
        Ok(Self { source })
    }

    /// Substitutes `snippet` verbatim. No escaping is applied.
    #[must_use]
    pub fn render(&self, snippet: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + snippet.len());
        for piece in scan(&self.source) {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Dollar => out.push('$'),
                Piece::Placeholder => out.push_str(snippet),
            }
        }
        out
    }
}

enum Piece<'a> {
    Text(&'a str),
    Dollar,
    Placeholder,
}

fn scan(source: &str) -> impl Iterator<Item = Piece<'_>> {
    let mut rest = source;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(idx) = rest.find('$') else {
            let text = rest;
            rest = "";
            return Some(Piece::Text(text));
        };
        if idx > 0 {
            let text = &rest[..idx];
            rest = &rest[idx..];
            return Some(Piece::Text(text));
        }

        let after = &rest[1..];
        if let Some(tail) = after.strip_prefix('$') {
            rest = tail;
            return Some(Piece::Dollar);
        }
        if let Some(tail) = after
            .strip_prefix('{')
            .and_then(|s| s.strip_prefix(PLACEHOLDER))
            .and_then(|s| s.strip_prefix('}'))
        {
            rest = tail;
            return Some(Piece::Placeholder);
        }
        if let Some(tail) = after.strip_prefix(PLACEHOLDER)
            && !tail.starts_with(|c: char| c.is_alphanumeric() || c == '_')
        {
            rest = tail;
            return Some(Piece::Placeholder);
        }

        rest = after;
        Some(Piece::Text("$"))
    })
}
