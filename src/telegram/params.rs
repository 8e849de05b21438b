//! Optional `sendMessage` parameters and parse mode resolution.

use log::warn;
use serde_json::{Map, Value};

use crate::formatter::{Markup, SharedFormatter};

use super::chat::ChatId;

/// Warning emitted when the formatter declares no markup mode.
pub const PARSE_MODE_WARNING: &str = "Formatter for handler has no parse mode declaration, \
messages are sent as plain text and markup in them will not be rendered";

/// Optional delivery settings shared by every message of a handler.
///
/// See <https://core.telegram.org/bots/api#sendmessage> for the meaning of
/// each field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliveryParameters {
    /// Send silently; recipients get a notification without sound.
    pub disable_notification: bool,
    /// Disable link previews for links in the message.
    pub disable_web_page_preview: bool,
    /// Reply to the message with this id.
    pub reply_to_message_id: Option<i64>,
    /// Inline keyboard, custom reply keyboard or similar interface options.
    pub reply_markup: Option<Value>,
}

impl DeliveryParameters {
    /// Request fields for the configured options.
    ///
    /// Only set options appear in the map; an absent key leaves the choice
    /// to the Bot API default.
    pub fn build_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(markup) = self.reply_markup.as_ref().filter(|m| is_truthy(m)) {
            params.insert("reply_markup".into(), markup.clone());
        }
        if let Some(id) = self.reply_to_message_id.filter(|&id| id != 0) {
            params.insert("reply_to_message_id".into(), id.into());
        }
        if self.disable_web_page_preview {
            params.insert("disable_web_page_preview".into(), true.into());
        }
        if self.disable_notification {
            params.insert("disable_notification".into(), true.into());
        }
        params
    }

    /// Full request body for one message.
    pub fn message_payload(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Map<String, Value> {
        let mut payload = self.build_params();
        payload.insert("chat_id".into(), Value::from(chat_id));
        payload.insert("text".into(), text.into());
        if let Some(mode) = parse_mode {
            payload.insert("parse_mode".into(), mode.into());
        }
        payload
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse mode declared by `formatter`.
///
/// A formatter without a declaration falls back to plain text and a
/// diagnostic warning is logged.
pub fn resolve_parse_mode(formatter: &SharedFormatter) -> Option<&'static str> {
    match formatter.markup() {
        Markup::Undeclared => {
            warn!("{PARSE_MODE_WARNING}");
            None
        }
        markup => markup.parse_mode(),
    }
}
