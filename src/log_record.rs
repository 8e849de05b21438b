//! Log event representation consumed by the Telegram sink.
//!
//! A [`LogEvent`] carries everything the formatter needs: severity, message,
//! origin (logger and call site), creation time, and optional error details
//! rendered as a code block.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::level::Level;

/// Error details attached to an event, rendered as a trailing code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Type name of the error (e.g. `io::Error`).
    pub kind: String,
    /// Preformatted traceback or backtrace text.
    pub traceback: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            traceback: traceback.into(),
        }
    }

    /// Build error details from any [`std::error::Error`], walking its
    /// `source()` chain into the traceback text.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut traceback = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            traceback.push_str("\n\nCaused by:\n    ");
            traceback.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            kind: short_type_name(err),
            traceback,
        }
    }
}

fn short_type_name(err: &(dyn std::error::Error + 'static)) -> String {
    // `dyn Error` erases the concrete type; the debug form starts with it.
    let debug = format!("{err:?}");
    debug
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("Error")
        .to_owned()
}

/// A single log event captured on the caller's thread.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    /// Severity of the event.
    pub level: Level,
    /// Message text, not yet escaped.
    pub message: String,
    /// Name of the logger that produced the event.
    pub logger: String,
    /// Name of the function or module path that emitted the event.
    pub call_site: String,
    /// Seconds since the Unix epoch at creation.
    pub timestamp: f64,
    /// Optional error details.
    pub error: Option<ErrorInfo>,
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

impl LogEvent {
    /// Construct an event stamped with the current time.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self {
            level,
            message: message.to_owned(),
            logger: logger.to_owned(),
            call_site: String::new(),
            timestamp: now_secs(),
            error: None,
        }
    }

    pub fn with_call_site(mut self, call_site: impl Into<String>) -> Self {
        self.call_site = call_site.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Whole seconds since the epoch, as used in correlation tags.
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.trunc() as i64
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[rstest]
    fn new_event_is_stamped_with_current_time() {
        let before = now_secs();
        let event = LogEvent::new("app", Level::Info, "hello");
        assert!(event.timestamp >= before);
        assert!(event.error.is_none());
        assert_eq!(event.to_string(), "INFO - hello");
    }

    #[rstest]
    #[case(1_700_000_000.999, 1_700_000_000)]
    #[case(0.5, 0)]
    fn epoch_seconds_truncates(#[case] timestamp: f64, #[case] expected: i64) {
        let event = LogEvent::new("app", Level::Info, "x").with_timestamp(timestamp);
        assert_eq!(event.epoch_seconds(), expected);
    }

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("loading settings failed")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[rstest]
    fn error_info_walks_source_chain() {
        let err = Wrapped(io::Error::new(io::ErrorKind::NotFound, "settings.toml"));
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.kind, "Wrapped");
        assert!(info.traceback.starts_with("loading settings failed"));
        assert!(info.traceback.contains("Caused by:\n    settings.toml"));
    }
}
