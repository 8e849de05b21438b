//! Configuration consumed by the Telegram handler lifecycle.
//!
//! `TelegramHandlerBuilder` constructs these values before passing them to
//! [`TelegramHandler`](super::TelegramHandler) for runtime use.

use std::{fmt, sync::Arc, time::Duration};

use serde_json::{Value, json};

use crate::formatter::SharedFormatter;
use crate::log_record::LogEvent;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

use super::chat::ChatId;
use super::params::DeliveryParameters;

/// Base URL of the Telegram Bot API.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write/request timeout applied to HTTP requests.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default bound on how long [`flush`](super::TelegramHandler::flush) waits.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

const REDACTED: &str = "<redacted>";

/// Callback invoked when formatting or sending an event fails unexpectedly.
///
/// Receives the event and a description of the failure.
pub type ErrorHook = Arc<dyn Fn(&LogEvent, &str) + Send + Sync>;

/// Configuration object describing how to construct a
/// [`TelegramHandler`](super::TelegramHandler).
#[derive(Clone)]
pub struct TelegramHandlerConfig {
    /// Bot token. Never logged.
    pub token: String,
    /// Chats receiving every event, in delivery order.
    pub chat_ids: Vec<ChatId>,
    /// Optional message parameters.
    pub params: DeliveryParameters,
    /// Proxy URL (`http://`, `socks5://`) applied to API requests.
    pub proxy: Option<String>,
    /// Base URL of the Bot API.
    pub api_base: String,
    /// Timeout for establishing connections.
    pub connect_timeout: Duration,
    /// Timeout for a whole request.
    pub write_timeout: Duration,
    /// Upper bound for a flush acknowledgement.
    pub flush_timeout: Duration,
    /// Interval between rate-limited warnings.
    pub warn_interval: Duration,
    /// Formatter used for every event until replaced.
    pub formatter: SharedFormatter,
    /// Hook for unexpected failures; `None` logs a warning.
    pub error_hook: Option<ErrorHook>,
}

impl Default for TelegramHandlerConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_ids: Vec::new(),
            params: DeliveryParameters::default(),
            proxy: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
            formatter: SharedFormatter::default(),
            error_hook: None,
        }
    }
}

impl TelegramHandlerConfig {
    /// `sendMessage` URL including the token.
    pub fn endpoint(&self) -> String {
        endpoint_for(&self.api_base, &self.token)
    }

    /// `sendMessage` URL with the token replaced, safe to print.
    pub fn redacted_endpoint(&self) -> String {
        endpoint_for(&self.api_base, REDACTED)
    }

    /// Proxy settings in the `{"https": url}` shape, or `null`.
    pub fn proxies(&self) -> Value {
        match &self.proxy {
            Some(proxy) => json!({ "http": proxy, "https": proxy }),
            None => Value::Null,
        }
    }
}

pub(crate) fn redact_token(token: &str, text: &str) -> String {
    if token.is_empty() {
        text.to_owned()
    } else {
        text.replace(token, REDACTED)
    }
}

fn endpoint_for(api_base: &str, token: &str) -> String {
    format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token)
}

impl fmt::Debug for TelegramHandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramHandlerConfig")
            .field("token", &REDACTED)
            .field("chat_ids", &self.chat_ids)
            .field("params", &self.params)
            .field("proxy", &self.proxy)
            .field("api_base", &self.api_base)
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("flush_timeout", &self.flush_timeout)
            .field("formatter", &self.formatter)
            .field("error_hook", &self.error_hook.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
