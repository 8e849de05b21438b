//! INI configuration for the Telegram handler.
//!
//! Settings live in a `[telegram]` section parsed with `rust-ini`:
//!
//! ```ini
//! [telegram]
//! token = 123456:ABC-DEF
//! chat_ids = -1001234567890, @alerts
//! disable_notification = true
//! reply_markup = {"inline_keyboard": []}
//! connect_timeout_ms = 2000
//! ```
//!
//! The result is a [`TelegramHandlerBuilder`], so the usual validation runs
//! when the handler is built.

use std::fs;
use std::path::Path;

use ini::{Ini, ParseOption};
use thiserror::Error;

use crate::handlers::TelegramHandlerBuilder;
use crate::telegram::ChatId;

/// Name of the section holding handler settings.
pub const SECTION: &str = "telegram";

/// Errors raised while loading handler settings from INI text.
#[derive(Debug, Error)]
pub enum FileConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid INI.
    #[error("{path} is invalid: {message}")]
    Parse { path: String, message: String },
    /// No `[telegram]` section exists.
    #[error("{path} has no [telegram] section")]
    MissingSection { path: String },
    /// A key holds a value of the wrong shape.
    #[error("invalid value for {key:?}: {message}")]
    InvalidValue { key: String, message: String },
    /// A key is not recognised.
    #[error("unknown key {0:?} in [telegram] section")]
    UnknownKey(String),
}

/// Read `path` and build a handler builder from its `[telegram]` section.
pub fn load_handler_builder(
    path: impl AsRef<Path>,
) -> Result<TelegramHandlerBuilder, FileConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| FileConfigError::Io {
        path: display.clone(),
        source,
    })?;
    parse_with_origin(&display, &text)
}

/// Build a handler builder from INI `text`.
pub fn parse_handler_builder(text: &str) -> Result<TelegramHandlerBuilder, FileConfigError> {
    parse_with_origin("<string>", text)
}

fn parse_with_origin(origin: &str, text: &str) -> Result<TelegramHandlerBuilder, FileConfigError> {
    // Quotes and backslashes are kept verbatim so JSON values survive.
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, options).map_err(|err| FileConfigError::Parse {
        path: origin.to_owned(),
        message: err.to_string(),
    })?;
    let section = ini
        .section(Some(SECTION))
        .ok_or_else(|| FileConfigError::MissingSection {
            path: origin.to_owned(),
        })?;

    let mut builder = TelegramHandlerBuilder::new();
    for (key, value) in section.iter() {
        builder = apply_entry(builder, key, value.trim())?;
    }
    Ok(builder)
}

fn apply_entry(
    builder: TelegramHandlerBuilder,
    key: &str,
    value: &str,
) -> Result<TelegramHandlerBuilder, FileConfigError> {
    Ok(match key {
        "token" => builder.with_token(value),
        "chat_ids" => builder.with_chat_ids(parse_chat_ids(key, value)?),
        "proxy" => builder.with_proxy(value),
        "api_base" => builder.with_api_base(value),
        "disable_notification" => builder.with_disable_notification(parse_bool(key, value)?),
        "disable_web_page_preview" => {
            builder.with_disable_web_page_preview(parse_bool(key, value)?)
        }
        "reply_to_message_id" => builder.with_reply_to_message_id(parse_number(key, value)?),
        "reply_markup" => {
            let markup = serde_json::from_str(value).map_err(|err| invalid(key, err))?;
            builder.with_reply_markup(markup)
        }
        "connect_timeout_ms" => builder.with_connect_timeout_ms(parse_number(key, value)?),
        "write_timeout_ms" => builder.with_write_timeout_ms(parse_number(key, value)?),
        "flush_timeout_ms" => builder.with_flush_timeout_ms(parse_number(key, value)?),
        other => return Err(FileConfigError::UnknownKey(other.to_owned())),
    })
}

fn parse_chat_ids(key: &str, value: &str) -> Result<Vec<ChatId>, FileConfigError> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<ChatId>().map_err(|err| invalid(key, err)))
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, FileConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(invalid(key, format!("{value:?} is not a boolean"))),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, FileConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err| invalid(key, err))
}

fn invalid(key: &str, err: impl std::fmt::Display) -> FileConfigError {
    FileConfigError::InvalidValue {
        key: key.to_owned(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[loggers]
keys = root

[telegram]
token = 123456:ABC-DEF
chat_ids = -1001234567890, @alerts
proxy = socks5://127.0.0.1:1080
disable_notification = yes
disable_web_page_preview = false
reply_to_message_id = 17
reply_markup = {"inline_keyboard": []}
connect_timeout_ms = 2000
write_timeout_ms = 9000
flush_timeout_ms = 100
"#;

    #[rstest]
    fn parses_every_supported_key() {
        let config = parse_handler_builder(FULL)
            .expect("valid ini")
            .build_config()
            .expect("valid builder");

        assert_eq!(config.token, "123456:ABC-DEF");
        assert_eq!(
            config.chat_ids,
            vec![
                ChatId::Id(-1_001_234_567_890),
                ChatId::Username("@alerts".into())
            ]
        );
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert!(config.params.disable_notification);
        assert!(!config.params.disable_web_page_preview);
        assert_eq!(config.params.reply_to_message_id, Some(17));
        assert_eq!(config.params.reply_markup, Some(json!({"inline_keyboard": []})));
        assert_eq!(config.connect_timeout.as_millis(), 2000);
        assert_eq!(config.write_timeout.as_millis(), 9000);
        assert_eq!(config.flush_timeout.as_millis(), 100);
    }

    #[rstest]
    fn missing_section_is_reported() {
        let err = parse_handler_builder("[loggers]\nkeys = root\n").expect_err("no section");
        assert!(matches!(err, FileConfigError::MissingSection { .. }));
    }

    #[rstest]
    #[case("colour = blue", "colour")]
    #[case("chat_ids = 1, bogus", "chat_ids")]
    #[case("disable_notification = maybe", "disable_notification")]
    #[case("connect_timeout_ms = soon", "connect_timeout_ms")]
    #[case("reply_markup = {broken", "reply_markup")]
    fn bad_entries_name_the_key(#[case] line: &str, #[case] key: &str) {
        let text = format!("[telegram]\ntoken = 1:a\n{line}\n");
        let err = parse_handler_builder(&text).expect_err("invalid entry");
        assert!(err.to_string().contains(key), "{err}");
    }

    #[rstest]
    fn loads_from_disk() {
        let mut file = NamedTempFile::new().expect("create temp ini file");
        write!(file, "{FULL}").expect("write ini contents");

        let builder = load_handler_builder(file.path()).expect("should parse");

        assert_eq!(
            builder.build_config().expect("valid builder").chat_ids.len(),
            2
        );
    }

    #[rstest]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_handler_builder(dir.path().join("absent.ini")).expect_err("no file");
        assert!(matches!(err, FileConfigError::Io { .. }));
    }
}
