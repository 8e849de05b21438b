//! Formatters turning [`LogEvent`] values into Telegram message text.
//!
//! Provides the core [`EventFormatter`] trait, the [`FragmentFormatter`]
//! capability used to split oversized messages, and the shared trait object
//! wrapper handed to the delivery worker. Capabilities are discovered through
//! trait methods rather than type inspection: a formatter that does not
//! override [`EventFormatter::as_fragmenting`] is sent unsplit, and one that
//! does not override [`EventFormatter::markup`] is sent as plain text.

use std::{fmt, sync::Arc};

use crate::log_record::LogEvent;

mod escape;
mod exception;
mod html;

pub use escape::escape_html;
pub use exception::format_error_info;
pub use html::{
    DEFAULT_TIME_FORMAT, END_CODE, HtmlFormatter, MAX_MESSAGE_SIZE, MIN_MESSAGE_SIZE, START_CODE,
};

/// Markup mode a formatter declares for the text it produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Markup {
    /// The formatter makes no declaration.
    #[default]
    Undeclared,
    /// Text is plain and must not be parsed for markup.
    Plain,
    Html,
    Markdown,
    MarkdownV2,
}

impl Markup {
    /// Value of the `parse_mode` request field, `None` for plain text.
    pub fn parse_mode(&self) -> Option<&'static str> {
        match self {
            Markup::Undeclared | Markup::Plain => None,
            Markup::Html => Some("HTML"),
            Markup::Markdown => Some("Markdown"),
            Markup::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// Trait for formatting log events into message text.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// built on a caller thread and used by the delivery worker.
pub trait EventFormatter: Send + Sync {
    /// Format an event into a single message.
    fn format(&self, event: &LogEvent) -> String;

    /// Markup mode of the produced text.
    fn markup(&self) -> Markup {
        Markup::Undeclared
    }

    /// Fragment splitting capability, if the formatter supports it.
    fn as_fragmenting(&self) -> Option<&dyn FragmentFormatter> {
        None
    }
}

/// Capability of splitting an oversized message into fragments.
pub trait FragmentFormatter {
    /// Format `event` and split the result into fragments no longer than
    /// [`max_message_size`](Self::max_message_size), starting at character
    /// offset `start` of the formatted text.
    fn format_by_fragments(&self, event: &LogEvent, start: usize) -> Vec<String>;

    /// Maximum fragment length in characters.
    fn max_message_size(&self) -> usize;
}

/// Shared formatter trait object used by the handler and its worker.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn EventFormatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: EventFormatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }

    /// Wrap an existing shared formatter trait object.
    pub fn from_arc(inner: Arc<dyn EventFormatter>) -> Self {
        Self { inner }
    }

    pub fn format(&self, event: &LogEvent) -> String {
        self.inner.format(event)
    }

    pub fn markup(&self) -> Markup {
        self.inner.markup()
    }

    /// Whether the wrapped formatter can split oversized messages.
    pub fn supports_fragments(&self) -> bool {
        self.inner.as_fragmenting().is_some()
    }

    /// Longest fragment the formatter aims for. Formatters that never
    /// split report the Bot API limit.
    pub fn max_message_size(&self) -> usize {
        self.inner
            .as_fragmenting()
            .map_or(MAX_MESSAGE_SIZE, |fragmenting| fragmenting.max_message_size())
    }

    /// Message fragments for `event`: split when the formatter supports it,
    /// otherwise the whole formatted message as a single fragment.
    pub fn fragments(&self, event: &LogEvent) -> Vec<String> {
        match self.inner.as_fragmenting() {
            Some(fragmenting) => fragmenting.format_by_fragments(event, 0),
            None => vec![self.inner.format(event)],
        }
    }
}

impl Default for SharedFormatter {
    fn default() -> Self {
        Self::new(HtmlFormatter::default())
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn EventFormatter>)")
    }
}

/// Formatter producing `logger [LEVEL] message` lines.
///
/// Declares no markup and cannot split, so messages formatted with it are
/// delivered as-is.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainFormatter;

impl EventFormatter for PlainFormatter {
    fn format(&self, event: &LogEvent) -> String {
        let mut output = format!("{} [{}] {}", event.logger, event.level, event.message);
        if let Some(error) = &event.error {
            output.push('\n');
            output.push_str(&format_error_info(error));
        }
        output
    }
}

impl EventFormatter for Arc<dyn EventFormatter> {
    fn format(&self, event: &LogEvent) -> String {
        (**self).format(event)
    }

    fn markup(&self) -> Markup {
        (**self).markup()
    }

    fn as_fragmenting(&self) -> Option<&dyn FragmentFormatter> {
        (**self).as_fragmenting()
    }
}
