//! Telegram Bot API logging handler.
//!
//! This module defines [`TelegramHandler`], a handler that formats
//! [`LogEvent`](crate::log_record::LogEvent) values as chat messages and
//! posts them to one or more chats through the Bot API `sendMessage` method.
//!
//! # Delivery Semantics
//!
//! - Events are queued without blocking and delivered by one worker thread
//!   in the order they were handled.
//! - Each event becomes one or more fragments. Every fragment is sent to
//!   every chat: chats in configured order, fragments in order within a chat.
//! - A non-2xx status, an `ok: false` answer or an unparseable body is
//!   logged as a warning. Nothing is retried.

pub mod chat;
mod client;
mod config;
mod handler;
mod params;
mod stream;
mod worker;


pub use chat::ChatId;
pub use client::{Delivery, HttpDelivery, SendOutcome, TelegramClient, interpret_response};
pub use config::{
    DEFAULT_API_BASE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_FLUSH_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
    ErrorHook, TelegramHandlerConfig,
};
pub use handler::TelegramHandler;
pub use params::{DeliveryParameters, PARSE_MODE_WARNING, resolve_parse_mode};
pub use stream::StreamDelivery;
pub use worker::FORMATTER_WARNING;
