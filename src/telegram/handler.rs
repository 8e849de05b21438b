//! Public handler type exported by the crate.

use std::{io::Write, thread, time::Duration};

use crossbeam_channel::{Sender, bounded};
use log::warn;
use parking_lot::{Mutex, RwLock};

use crate::{
    formatter::{EventFormatter, SharedFormatter},
    handler::{HandlerError, LogHandler},
    handlers::HandlerBuildError,
    log_record::LogEvent,
    rate_limited_warner::RateLimitedWarner,
};

use super::{
    client::{Delivery, HttpDelivery, TelegramClient},
    config::TelegramHandlerConfig,
    stream::StreamDelivery,
    worker::{FORMATTER_WARNING, TelegramCommand, WorkerParts, spawn_worker},
};

/// Handler forwarding log events to Telegram chats.
///
/// Events are queued on an unbounded channel and delivered by a single
/// background thread, so [`handle`](LogHandler::handle) never waits on the
/// network. Oversized messages are split by the formatter and every fragment
/// is sent to every configured chat. Delivery is best effort: failures are
/// logged as diagnostics and the event is dropped.
///
/// [`close`](Self::close) drains everything queued before it, then stops the
/// worker. Events handled after `close` are rejected with
/// [`HandlerError::Closed`].
pub struct TelegramHandler {
    tx: RwLock<Option<Sender<TelegramCommand>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    warner: RateLimitedWarner,
    flush_timeout: Duration,
}

impl TelegramHandler {
    /// Construct a handler posting to the Bot API.
    pub fn with_config(config: TelegramHandlerConfig) -> Result<Self, HandlerBuildError> {
        let delivery = HttpDelivery::new(&config)?;
        Self::with_delivery(Box::new(delivery), config)
    }

    /// Construct a handler that writes each request as a JSON line to
    /// `writer` instead of sending it.
    pub fn stream<W>(writer: W, config: TelegramHandlerConfig) -> Result<Self, HandlerBuildError>
    where
        W: Write + Send + 'static,
    {
        let delivery = StreamDelivery::new(writer, &config);
        Self::with_delivery(Box::new(delivery), config)
    }

    /// Construct a handler around a custom [`Delivery`].
    pub fn with_delivery(
        delivery: Box<dyn Delivery>,
        config: TelegramHandlerConfig,
    ) -> Result<Self, HandlerBuildError> {
        if config.chat_ids.is_empty() {
            return Err(HandlerBuildError::InvalidConfig(
                "at least one chat id is required".into(),
            ));
        }
        if !config.formatter.supports_fragments() {
            warn!("{FORMATTER_WARNING}");
        }
        let warner = RateLimitedWarner::new(config.warn_interval);
        let flush_timeout = config.flush_timeout;
        let parts = WorkerParts {
            client: TelegramClient::new(delivery, config.params),
            chat_ids: config.chat_ids,
            formatter: config.formatter,
            error_hook: config.error_hook,
        };
        let (tx, handle) = spawn_worker(parts)?;
        Ok(Self {
            tx: RwLock::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            warner,
            flush_timeout,
        })
    }

    /// Replace the formatter for events handled after this call.
    ///
    /// A formatter that cannot split messages is accepted with a warning;
    /// its output is sent unsplit.
    pub fn set_formatter<F>(&self, formatter: F)
    where
        F: EventFormatter + 'static,
    {
        self.set_shared_formatter(SharedFormatter::new(formatter));
    }

    /// Replace the formatter with an already shared instance.
    pub fn set_shared_formatter(&self, formatter: SharedFormatter) {
        if !formatter.supports_fragments() {
            warn!("{FORMATTER_WARNING}");
        }
        if let Some(tx) = self.sender() {
            let _ = tx.send(TelegramCommand::SetFormatter(formatter));
        }
    }

    /// Wait until every event handled before this call has been delivered.
    pub fn flush(&self) -> bool {
        <Self as LogHandler>::flush(self)
    }

    /// Drain the queue, then stop and join the worker.
    ///
    /// Blocks until all events queued before the call have been processed.
    /// Calling `close` again is a no-op.
    pub fn close(&self) {
        let Some(tx) = self.tx.write().take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(TelegramCommand::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
        drop(tx);
        self.join_worker();
        self.warner.flush(|count| {
            warn!("TelegramHandler dropped {count} events after close");
        });
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.tx.read().is_none()
    }

    fn sender(&self) -> Option<Sender<TelegramCommand>> {
        self.tx.read().as_ref().cloned()
    }

    fn join_worker(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("TelegramHandler: worker thread panicked");
        }
    }

    fn record_drop(&self, reason: &str) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("TelegramHandler dropped {count} events: {reason}");
        });
    }
}

impl LogHandler for TelegramHandler {
    fn handle(&self, event: LogEvent) -> Result<(), HandlerError> {
        // The read guard is held across the send so `close` cannot take the
        // sender between the check and the enqueue.
        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            drop(guard);
            self.record_drop("handler is closed");
            return Err(HandlerError::Closed);
        };
        if tx.send(TelegramCommand::Record(event)).is_err() {
            drop(guard);
            self.record_drop("worker has stopped");
            return Err(HandlerError::Disconnected);
        }
        Ok(())
    }

    fn flush(&self) -> bool {
        let Some(tx) = self.sender() else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(TelegramCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(self.flush_timeout).is_ok()
    }
}

impl Drop for TelegramHandler {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TelegramHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramHandler")
            .field("closed", &self.is_closed())
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}
