//! Chat identifiers accepted by the Bot API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target of a `sendMessage` call: a numeric chat id or a public
/// `@channelusername`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<&ChatId> for serde_json::Value {
    fn from(chat_id: &ChatId) -> Self {
        match chat_id {
            ChatId::Id(id) => (*id).into(),
            ChatId::Username(name) => name.as_str().into(),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| ChatId::Username(value.to_owned()))
    }
}

impl From<String> for ChatId {
    fn from(value: String) -> Self {
        ChatId::from(value.as_str())
    }
}

impl FromStr for ChatId {
    type Err = String;

    /// Parse a numeric id or an `@username`; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(ChatId::Id(id));
        }
        if s.len() > 1 && s.starts_with('@') {
            return Ok(ChatId::Username(s.to_owned()));
        }
        Err(format!("invalid chat id {s:?}"))
    }
}
