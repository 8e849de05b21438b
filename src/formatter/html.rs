//! HTML formatter with fragment splitting for oversized messages.
//!
//! Messages are rendered as
//!
//! ```text
//! <b>LEVEL</b>
//!
//! 2024-01-01 12:00:00,000: escaped message
//!
//! <pre>escaped traceback</pre>
//! ```
//!
//! When the rendered text exceeds [`MAX_MESSAGE_SIZE`] the traceback is
//! split across several messages. Each fragment keeps valid markup by
//! re-wrapping its slice of the code block, and every fragment ends with
//! the same correlation hashtag so readers can group them.
//!
//! Splitting assumes there is at most one code block (the traceback) and
//! that the header before it fits into a single fragment together with the
//! hashtag. Messages without a code block, and messages whose hashtag leaves
//! no room for code, are returned unsplit.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::log_record::LogEvent;

use super::{
    EventFormatter, FragmentFormatter, Markup,
    escape::{MAX_ENTITY_LEN, escape_html},
    exception::format_error_info,
};

/// Maximum length of a Telegram text message, in characters.
pub const MAX_MESSAGE_SIZE: usize = 4096;
/// Smallest accepted fragment limit. Leaves room for the header, the
/// hashtag and some code per fragment.
pub const MIN_MESSAGE_SIZE: usize = 256;
/// Opening fence of the code block.
pub const START_CODE: &str = "<pre>";
/// Closing fence of the code block.
pub const END_CODE: &str = "</pre>";
/// `strftime` pattern used for the timestamp line.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formatter rendering events as Telegram HTML.
#[derive(Clone, Debug)]
pub struct HtmlFormatter {
    max_message_size: usize,
    time_format: String,
    local_time: bool,
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            time_format: DEFAULT_TIME_FORMAT.to_owned(),
            local_time: false,
        }
    }
}

impl HtmlFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum fragment length.
    ///
    /// Values below [`MIN_MESSAGE_SIZE`] are raised to it.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size.max(MIN_MESSAGE_SIZE);
        self
    }

    /// Override the `strftime` pattern of the timestamp line.
    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    /// Render timestamps in the local time zone instead of UTC.
    pub fn with_local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    /// Correlation tag appended to every fragment of `event`.
    pub fn hashtag(&self, event: &LogEvent) -> String {
        format!(
            "\n\n#{}.{}.{}",
            event.epoch_seconds(),
            event.logger,
            event.call_site
        )
    }

    /// Escape `code_text` and wrap it in code fences.
    pub fn mark_code(&self, code_text: &str) -> String {
        wrap_code(&escape_html(code_text))
    }

    /// Render the event timestamp using the configured pattern.
    pub fn format_time(&self, event: &LogEvent) -> String {
        let secs = event.timestamp.floor();
        let nanos = ((event.timestamp - secs) * 1e9) as u32;
        let Some(utc) = DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
        else {
            return event.timestamp.to_string();
        };
        let mut rendered = String::new();
        let written = if self.local_time {
            write!(rendered, "{}", utc.with_timezone(&Local).format(&self.time_format))
        } else {
            write!(rendered, "{}", utc.format(&self.time_format))
        };
        // An invalid pattern makes chrono fail the write instead of panicking.
        if written.is_err() {
            return utc.format(DEFAULT_TIME_FORMAT).to_string();
        }
        rendered
    }
}

fn wrap_code(escaped: &str) -> String {
    format!("{START_CODE}{escaped}{END_CODE}")
}

impl EventFormatter for HtmlFormatter {
    fn format(&self, event: &LogEvent) -> String {
        let description = event
            .error
            .as_ref()
            .map(|error| self.mark_code(&format_error_info(error)))
            .unwrap_or_default();
        format!(
            "<b>{}</b>\n\n{}: {}\n\n{}",
            event.level,
            self.format_time(event),
            escape_html(&event.message),
            description
        )
    }

    fn markup(&self) -> Markup {
        Markup::Html
    }

    fn as_fragmenting(&self) -> Option<&dyn FragmentFormatter> {
        Some(self)
    }
}

impl FragmentFormatter for HtmlFormatter {
    fn format_by_fragments(&self, event: &LogEvent, start: usize) -> Vec<String> {
        let message = self.format(event);
        if message.chars().count() <= self.max_message_size {
            return vec![message];
        }
        let tag = self.hashtag(event);
        split_code_block(&message, &tag, start, self.max_message_size)
            .unwrap_or_else(|| vec![message])
    }

    fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

/// Split `message` into a header fragment and code-block fragments.
///
/// Returns `None` when the message has no code block after `start` or the
/// budget leaves no room for an HTML entity per fragment.
fn split_code_block(message: &str, tag: &str, start: usize, max: usize) -> Option<Vec<String>> {
    let chars: Vec<char> = message.chars().collect();
    let start = start.min(chars.len());
    let code_start = find_marker(&chars, START_CODE, start)?;

    let tag_len = tag.chars().count();
    let start_len = START_CODE.chars().count();
    let end_len = END_CODE.chars().count();
    let budget = max.checked_sub(tag_len + start_len + end_len)?;
    if budget < MAX_ENTITY_LEN {
        return None;
    }

    let content_start = code_start + start_len;
    let content_end = if message.ends_with(END_CODE) {
        chars.len() - end_len
    } else {
        chars.len()
    };

    let header: String = chars[start..code_start].iter().collect();
    let mut fragments = vec![format!("{header}{tag}")];

    let mut pos = content_start;
    while pos < content_end {
        let end = window_end(&chars, pos, budget, content_end);
        let content: String = chars[pos..end].iter().collect();
        fragments.push(format!("{}{tag}", wrap_code(&content)));
        pos = end;
    }
    Some(fragments)
}

/// End of the code window starting at `pos`, pulled back so that it does
/// not cut an HTML entity in half. Never passes `limit`.
fn window_end(chars: &[char], pos: usize, budget: usize, limit: usize) -> usize {
    let end = (pos + budget).min(limit);
    if end == limit {
        return end;
    }
    let lookback = end.saturating_sub(MAX_ENTITY_LEN - 1).max(pos);
    if let Some(amp) = chars[lookback..end].iter().rposition(|&c| c == '&') {
        let amp = lookback + amp;
        if amp > pos && !chars[amp..end].contains(&';') {
            return amp;
        }
    }
    end
}

fn find_marker(chars: &[char], marker: &str, from: usize) -> Option<usize> {
    let marker: Vec<char> = marker.chars().collect();
    if chars.len() < marker.len() {
        return None;
    }
    (from..=chars.len() - marker.len()).find(|&i| chars[i..i + marker.len()] == marker[..])
}
