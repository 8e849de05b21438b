//! Compatibility bridge for the Rust `log` crate.
//!
//! This module provides [`TelegramLogAdapter`], an implementation of
//! `log::Log` that converts records into [`LogEvent`]s and hands them to a
//! [`LogHandler`]. [`init`] installs the adapter as the global logger.
//!
//! The handler reports its own failures through `log` under the
//! [`DIAGNOSTIC_TARGET`] prefix. Those records are never forwarded to the
//! handler; they are printed to stderr instead so a failing chat cannot feed
//! itself more messages.

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

use crate::DIAGNOSTIC_TARGET;
use crate::handler::LogHandler;
use crate::level::Level;
use crate::log_record::LogEvent;

/// Adapter implementing the Rust `log::Log` trait.
pub struct TelegramLogAdapter {
    handler: Arc<dyn LogHandler>,
    level: LevelFilter,
    diagnostics: Mutex<Box<dyn Write + Send>>,
}

impl TelegramLogAdapter {
    /// Forward records at or above `level` to `handler`.
    pub fn new(handler: Arc<dyn LogHandler>, level: LevelFilter) -> Self {
        Self {
            handler,
            level,
            diagnostics: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Write diagnostics to `writer` instead of stderr.
    pub fn with_diagnostic_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.diagnostics = Mutex::new(Box::new(writer));
        self
    }

    fn write_diagnostic(&self, record: &Record<'_>) {
        if record.level() > log::Level::Info {
            return;
        }
        let module = record
            .module_path()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or_else(|| record.target());
        let mut writer = self.diagnostics.lock();
        // Nowhere left to report a failing stderr.
        let _ = writeln!(
            writer,
            "{DIAGNOSTIC_TARGET} : {}: {module}: {}",
            Level::from(record.level()),
            record.args()
        );
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

fn is_diagnostic(target: &str) -> bool {
    target
        .strip_prefix(DIAGNOSTIC_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Convert a `log` record into an event.
pub fn event_from_record(record: &Record<'_>) -> LogEvent {
    let event = LogEvent::new(
        &normalise_target(record.target()),
        Level::from(record.level()),
        &record.args().to_string(),
    );
    match record.line() {
        Some(line) => event.with_call_site(format!("L{line}")),
        None => event,
    }
}

impl log::Log for TelegramLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if is_diagnostic(record.target()) {
            self.write_diagnostic(record);
            return;
        }
        if !self.enabled(record.metadata()) {
            return;
        }
        // A rejected event has already been reported by the handler.
        let _ = self.handler.handle(event_from_record(record));
    }

    fn flush(&self) {
        self.handler.flush();
        let _ = self.diagnostics.lock().flush();
    }
}

/// Install an adapter for `handler` as the global Rust logger.
///
/// # Errors
///
/// Fails when a different global logger has already been set.
pub fn init(handler: Arc<dyn LogHandler>, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(TelegramLogAdapter::new(handler, level)))?;
    // Diagnostics below `level` still have to reach stderr.
    log::set_max_level(level.max(LevelFilter::Info));
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for the `log` crate bridge.

    use super::*;
    use crate::handler::HandlerError;
    use log::Log;
    use rstest::{fixture, rstest};

    #[derive(Clone, Default)]
    struct CollectingHandler {
        events: Arc<Mutex<Vec<LogEvent>>>,
    }

    impl CollectingHandler {
        fn collected(&self) -> Vec<LogEvent> {
            self.events.lock().clone()
        }
    }

    impl LogHandler for CollectingHandler {
        fn handle(&self, event: LogEvent) -> Result<(), HandlerError> {
            self.events.lock().push(event);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        adapter: TelegramLogAdapter,
        handler: CollectingHandler,
        diagnostics: SharedBuffer,
    }

    #[fixture]
    fn bridge() -> Fixture {
        let handler = CollectingHandler::default();
        let diagnostics = SharedBuffer::default();
        let adapter = TelegramLogAdapter::new(Arc::new(handler.clone()), LevelFilter::Warn)
            .with_diagnostic_writer(diagnostics.clone());
        Fixture {
            adapter,
            handler,
            diagnostics,
        }
    }

    fn emit(adapter: &TelegramLogAdapter, level: log::Level, target: &str, message: &str) {
        adapter.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(target)
                .module_path(Some("telegram_logging::telegram::client"))
                .line(Some(42))
                .build(),
        );
    }

    #[rstest]
    fn forwards_records_as_events(bridge: Fixture) {
        emit(&bridge.adapter, log::Level::Error, "service::db", "connection lost");

        let events = bridge.handler.collected();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].logger, "service.db");
        assert_eq!(events[0].level, Level::Error);
        assert_eq!(events[0].message, "connection lost");
        assert_eq!(events[0].call_site, "L42");
    }

    #[rstest]
    fn drops_records_below_threshold(bridge: Fixture) {
        emit(&bridge.adapter, log::Level::Info, "service", "chatty");
        emit(&bridge.adapter, log::Level::Warn, "service", "careful");

        let events = bridge.handler.collected();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::Warning);
    }

    #[rstest]
    fn diagnostics_go_to_writer_not_handler(bridge: Fixture) {
        emit(
            &bridge.adapter,
            log::Level::Warn,
            "telegram_logging::telegram::client",
            "Request to Telegram got error with code 404; response is: Not Found",
        );
        emit(&bridge.adapter, log::Level::Debug, "telegram_logging", "noise");

        assert!(bridge.handler.collected().is_empty());
        assert_eq!(
            bridge.diagnostics.contents(),
            "telegram_logging : WARNING: client: Request to Telegram got error with code 404; \
             response is: Not Found\n"
        );
    }

    #[rstest]
    #[case("telegram_logging", true)]
    #[case("telegram_logging::worker", true)]
    #[case("telegram_logging_extra", false)]
    #[case("app::telegram_logging", false)]
    fn recognises_diagnostic_targets(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(is_diagnostic(target), expected);
    }
}
