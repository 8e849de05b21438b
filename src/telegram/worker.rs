//! Worker thread driving Telegram delivery.
//!
//! The worker owns the consumer side of an unbounded FIFO channel. For each
//! event it asks the formatter for fragments, then sends every fragment to
//! every chat in order: chats outer, fragments inner. Sends are sequential,
//! so the client needs no synchronisation and network latency never reaches
//! the threads that log.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    thread,
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use log::warn;

use crate::{
    formatter::SharedFormatter,
    log_record::LogEvent,
};

use super::{
    chat::ChatId,
    client::TelegramClient,
    config::ErrorHook,
    params::resolve_parse_mode,
};

/// Warning emitted when a formatter without fragment support is installed.
pub const FORMATTER_WARNING: &str = "Formatter does not support splitting messages into \
fragments; messages longer than the Telegram limit may be rejected";

/// Commands processed by the worker thread.
pub enum TelegramCommand {
    Record(LogEvent),
    SetFormatter(SharedFormatter),
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Everything the worker needs, moved onto its thread.
pub struct WorkerParts {
    pub client: TelegramClient,
    pub chat_ids: Vec<ChatId>,
    pub formatter: SharedFormatter,
    pub error_hook: Option<ErrorHook>,
}

/// Spawns the background worker thread.
///
/// # Returns
///
/// A sender for submitting [`TelegramCommand`]s and the thread's join handle.
///
/// # Errors
///
/// Returns the OS error when the thread cannot be spawned.
pub fn spawn_worker(
    parts: WorkerParts,
) -> io::Result<(Sender<TelegramCommand>, thread::JoinHandle<()>)> {
    let (tx, rx) = unbounded();
    let handle = thread::Builder::new()
        .name("telegram-logging".into())
        .spawn(move || Worker::new(parts).run(rx))?;
    Ok((tx, handle))
}

struct Worker {
    client: TelegramClient,
    chat_ids: Vec<ChatId>,
    formatter: SharedFormatter,
    error_hook: Option<ErrorHook>,
}

impl Worker {
    fn new(parts: WorkerParts) -> Self {
        Self {
            client: parts.client,
            chat_ids: parts.chat_ids,
            formatter: parts.formatter,
            error_hook: parts.error_hook,
        }
    }

    /// Deliver one event, containing any panic raised while formatting or
    /// sending so the worker keeps draining the queue.
    fn handle_record_command(&mut self, event: LogEvent) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&event)));
        if let Err(payload) = result {
            let reason = panic_message(payload.as_ref());
            match &self.error_hook {
                Some(hook) => hook(&event, &reason),
                None => warn!(
                    "Failed to deliver log event from logger {:?}: {reason}",
                    event.logger
                ),
            }
        }
    }

    fn dispatch(&mut self, event: &LogEvent) {
        let fragments = self.formatter.fragments(event);
        let limit = self.formatter.max_message_size();
        if fragments
            .iter()
            .any(|fragment| fragment.chars().count() > limit)
        {
            warn!(
                "Log message from logger {:?} exceeds {limit} characters and may be rejected",
                event.logger
            );
        }
        let parse_mode = resolve_parse_mode(&self.formatter);
        for chat_id in &self.chat_ids {
            for fragment in &fragments {
                self.client.send(chat_id, fragment, parse_mode);
            }
        }
    }

    fn handle_flush_command(&mut self, ack: Sender<()>) {
        // Ignore send error: if the receiver has dropped, there's nothing to do.
        let _ = ack.send(());
    }

    fn run(mut self, rx: Receiver<TelegramCommand>) {
        loop {
            match rx.recv() {
                Ok(TelegramCommand::Record(event)) => self.handle_record_command(event),
                Ok(TelegramCommand::SetFormatter(formatter)) => self.formatter = formatter,
                Ok(TelegramCommand::Flush(ack)) => self.handle_flush_command(ack),
                Ok(TelegramCommand::Shutdown(ack)) => {
                    self.drain_pending(&rx);
                    self.handle_flush_command(ack);
                    break;
                }
                Err(_) => break,
            }
        }
    }

    fn drain_pending(&mut self, rx: &Receiver<TelegramCommand>) {
        loop {
            match rx.try_recv() {
                Ok(TelegramCommand::Record(event)) => self.handle_record_command(event),
                Ok(TelegramCommand::SetFormatter(formatter)) => self.formatter = formatter,
                Ok(TelegramCommand::Flush(ack)) | Ok(TelegramCommand::Shutdown(ack)) => {
                    self.handle_flush_command(ack)
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
