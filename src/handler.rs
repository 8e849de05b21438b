use thiserror::Error;

use crate::log_record::LogEvent;

/// Errors returned when an event cannot be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler has been closed and accepts no more events.
    #[error("handler is closed")]
    Closed,
    /// The worker thread is gone and the queue has no consumer.
    #[error("handler worker has stopped")]
    Disconnected,
}

/// Trait implemented by log sinks.
///
/// Handlers are `Send + Sync` so one instance can be shared by every thread
/// that logs. Implementations forward the event to their own consumer thread
/// without blocking the caller on I/O.
pub trait LogHandler: Send + Sync {
    /// Queue an event for delivery.
    fn handle(&self, event: LogEvent) -> Result<(), HandlerError>;

    /// Wait for queued events to be processed. Returns `false` when the
    /// handler could not confirm completion.
    fn flush(&self) -> bool {
        true
    }
}
