//! Markup escaping for user-supplied text.
//!
//! Telegram's HTML parse mode rejects messages containing a bare `<`, `>`
//! or `&` that is not part of a tag or entity, so every piece of text that
//! did not originate in the formatter passes through [`escape_html`].

use std::borrow::Cow;

/// Replace `&`, `<` and `>` with their HTML entities.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Longest entity produced by [`escape_html`], in characters.
pub(crate) const MAX_ENTITY_LEN: usize = "&amp;".len();
