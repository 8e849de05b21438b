//! Development delivery that prints requests instead of sending them.
//!
//! Each payload becomes one JSON line `{"url", "params", "proxies"}` on the
//! wrapped writer, showing exactly what would be posted to the Bot API. The
//! token in the URL is redacted.

use std::io::Write;

use serde_json::{Map, Value, json};

use super::{
    client::{Delivery, SendOutcome},
    config::TelegramHandlerConfig,
};

/// Delivery writing request descriptions to an `io::Write` stream.
pub struct StreamDelivery<W> {
    writer: W,
    url: String,
    proxies: Value,
}

impl<W: Write + Send> StreamDelivery<W> {
    pub fn new(writer: W, config: &TelegramHandlerConfig) -> Self {
        Self {
            writer,
            url: config.redacted_endpoint(),
            proxies: config.proxies(),
        }
    }

    /// Consume the delivery and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Delivery for StreamDelivery<W> {
    fn deliver(&mut self, payload: &Map<String, Value>) -> SendOutcome {
        let line = json!({
            "url": self.url,
            "params": payload,
            "proxies": self.proxies,
        });
        // The client reports the failed outcome.
        match writeln!(self.writer, "{line}").and_then(|()| self.writer.flush()) {
            Ok(()) => SendOutcome::Delivered,
            Err(err) => SendOutcome::Transport(format!("stream write failed: {err}")),
        }
    }
}
