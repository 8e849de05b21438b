//! Builder for [`TelegramHandler`](crate::telegram::TelegramHandler).
//!
//! Exposes the bot token, target chats, optional `sendMessage` parameters,
//! proxy and timeouts. Validation happens in [`build_inner`]; an invalid
//! builder never spawns a worker thread.
//!
//! [`build_inner`]: HandlerBuilderTrait::build_inner

use std::{fmt, io::Write, sync::Arc, time::Duration};

use serde_json::Value;

use crate::formatter::{EventFormatter, SharedFormatter};
use crate::log_record::LogEvent;
use crate::telegram::{
    ChatId, DeliveryParameters, ErrorHook, TelegramHandler, TelegramHandlerConfig,
};

use super::{HandlerBuildError, HandlerBuilderTrait};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`TelegramHandler`] instances.
#[derive(Clone, Default)]
pub struct TelegramHandlerBuilder {
    token: Option<String>,
    chat_ids: Vec<ChatId>,
    params: DeliveryParameters,
    proxy: Option<String>,
    api_base: Option<String>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    flush_timeout_ms: Option<u64>,
    formatter: Option<SharedFormatter>,
    error_hook: Option<ErrorHook>,
}

impl TelegramHandlerBuilder {
    /// Create a new builder with no token or chats configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bot token (required).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Add a chat receiving every event.
    pub fn with_chat_id(mut self, chat_id: impl Into<ChatId>) -> Self {
        self.chat_ids.push(chat_id.into());
        self
    }

    /// Replace the list of chats receiving every event.
    pub fn with_chat_ids<I, C>(mut self, chat_ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChatId>,
    {
        self.chat_ids = chat_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Route API requests through a proxy (`http://`, `socks5://`).
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Send messages silently.
    pub fn with_disable_notification(mut self, value: bool) -> Self {
        self.params.disable_notification = value;
        self
    }

    /// Disable link previews.
    pub fn with_disable_web_page_preview(mut self, value: bool) -> Self {
        self.params.disable_web_page_preview = value;
        self
    }

    /// Send every message as a reply to `message_id`.
    pub fn with_reply_to_message_id(mut self, message_id: i64) -> Self {
        self.params.reply_to_message_id = Some(message_id);
        self
    }

    /// Attach a keyboard or other reply markup object.
    pub fn with_reply_markup(mut self, markup: Value) -> Self {
        self.params.reply_markup = Some(markup);
        self
    }

    /// Override the Bot API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    option_setter!(
        #[doc = "Set the connect timeout in milliseconds."]
        with_connect_timeout_ms,
        connect_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the write/request timeout in milliseconds."]
        with_write_timeout_ms,
        write_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set how long `flush` waits for the worker, in milliseconds."]
        with_flush_timeout_ms,
        flush_timeout_ms,
        u64
    );

    /// Use `formatter` instead of the HTML formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: EventFormatter + 'static,
    {
        self.formatter = Some(SharedFormatter::new(formatter));
        self
    }

    /// Call `hook` when formatting or sending an event fails unexpectedly.
    pub fn with_error_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&LogEvent, &str) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.validate_token()?;
        self.validate_chat_ids()?;
        self.validate_proxy()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_token(&self) -> Result<(), HandlerBuildError> {
        match &self.token {
            None => Err(HandlerBuildError::InvalidConfig(
                "Telegram handler requires a bot token".into(),
            )),
            Some(token) if token.trim().is_empty() => Err(HandlerBuildError::InvalidConfig(
                "token must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_chat_ids(&self) -> Result<(), HandlerBuildError> {
        if self.chat_ids.is_empty() {
            return Err(HandlerBuildError::InvalidConfig(
                "at least one chat id is required".into(),
            ));
        }
        if let Some(ChatId::Username(name)) = self
            .chat_ids
            .iter()
            .find(|chat| matches!(chat, ChatId::Username(name) if name.trim().is_empty()))
        {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "invalid chat id {name:?}"
            )));
        }
        Ok(())
    }

    fn validate_proxy(&self) -> Result<(), HandlerBuildError> {
        if let Some(proxy) = &self.proxy {
            ureq::Proxy::new(proxy).map_err(|err| {
                HandlerBuildError::InvalidConfig(format!("invalid proxy {proxy:?}: {err}"))
            })?;
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), HandlerBuildError> {
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        if let Some(timeout) = self.flush_timeout_ms {
            ensure_positive!(timeout, "flush_timeout_ms")?;
        }
        Ok(())
    }

    /// Validate the builder and produce the handler configuration.
    pub fn build_config(&self) -> Result<TelegramHandlerConfig, HandlerBuildError> {
        self.validate()?;

        let defaults = TelegramHandlerConfig::default();
        Ok(TelegramHandlerConfig {
            token: self.token.clone().unwrap_or_default(),
            chat_ids: self.chat_ids.clone(),
            params: self.params.clone(),
            proxy: self.proxy.clone(),
            api_base: self.api_base.clone().unwrap_or(defaults.api_base),
            connect_timeout: self
                .connect_timeout_ms
                .map_or(defaults.connect_timeout, Duration::from_millis),
            write_timeout: self
                .write_timeout_ms
                .map_or(defaults.write_timeout, Duration::from_millis),
            flush_timeout: self
                .flush_timeout_ms
                .map_or(defaults.flush_timeout, Duration::from_millis),
            warn_interval: defaults.warn_interval,
            formatter: self.formatter.clone().unwrap_or(defaults.formatter),
            error_hook: self.error_hook.clone(),
        })
    }

    /// Build a handler that writes requests to `writer` instead of sending
    /// them.
    pub fn build_stream<W>(&self, writer: W) -> Result<TelegramHandler, HandlerBuildError>
    where
        W: Write + Send + 'static,
    {
        TelegramHandler::stream(writer, self.build_config()?)
    }
}

impl HandlerBuilderTrait for TelegramHandlerBuilder {
    type Handler = TelegramHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        TelegramHandler::with_config(self.build_config()?)
    }
}

impl fmt::Debug for TelegramHandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramHandlerBuilder")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("chat_ids", &self.chat_ids)
            .field("params", &self.params)
            .field("proxy", &self.proxy)
            .field("api_base", &self.api_base)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .field("flush_timeout_ms", &self.flush_timeout_ms)
            .field("formatter", &self.formatter)
            .finish_non_exhaustive()
    }
}
