//! Asynchronous log sink delivering events to Telegram chats.
//!
//! [`TelegramHandler`] accepts [`LogEvent`]s without blocking, formats them
//! as HTML, splits oversized tracebacks into fragments and posts every
//! fragment to every configured chat from a background thread. Failures are
//! reported through the `log` crate under [`DIAGNOSTIC_TARGET`] and never
//! reach the code that logged.
//!
//! Handlers are usually assembled with [`TelegramHandlerBuilder`] or loaded
//! from an INI file via [`load_handler_builder`]. With the `log-compat`
//! feature, [`log_compat::init`] routes `log` macros into a handler.

pub mod file_config;
pub mod formatter;
pub mod handler;
pub mod handlers;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod rate_limited_warner;
pub mod telegram;

#[cfg(test)]
mod test_utils;

/// `log` target prefix of the crate's own diagnostics.
pub const DIAGNOSTIC_TARGET: &str = "telegram_logging";

pub use file_config::{FileConfigError, load_handler_builder, parse_handler_builder};
pub use formatter::{
    EventFormatter, FragmentFormatter, HtmlFormatter, Markup, PlainFormatter, SharedFormatter,
};
pub use handler::{HandlerError, LogHandler};
pub use handlers::{HandlerBuildError, HandlerBuilderTrait, TelegramHandlerBuilder};
pub use level::Level;
pub use log_record::{ErrorInfo, LogEvent};
pub use telegram::{
    ChatId, Delivery, DeliveryParameters, SendOutcome, StreamDelivery, TelegramHandler,
    TelegramHandlerConfig,
};
