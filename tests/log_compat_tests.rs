//! Installing the `log` bridge as the global logger.
//!
//! Kept in its own test binary because the global logger can be set once
//! per process.
#![cfg(feature = "log-compat")]

mod test_utils;

use std::sync::Arc;

use log::LevelFilter;
use rstest::rstest;
use telegram_logging::{LogHandler, TelegramHandlerBuilder, log_compat};
use test_utils::SharedBuf;
use test_utils::fixtures::builder;

#[rstest]
fn log_macros_reach_the_handler(builder: TelegramHandlerBuilder) {
    let buffer = SharedBuf::default();
    let handler = Arc::new(
        builder
            .with_chat_ids([7_i64])
            .build_stream(buffer.clone())
            .expect("stream handler builds"),
    );
    log_compat::init(Arc::clone(&handler) as Arc<dyn LogHandler>, LevelFilter::Info)
        .expect("install global logger");

    log::debug!(target: "app::db", "too detailed");
    log::error!(target: "app::db", "query <slow>");
    log::warn!(target: "telegram_logging::telegram", "diagnostic only");
    handler.close();

    let lines = buffer.json_lines();
    assert_eq!(lines.len(), 1);
    let text = lines[0]["params"]["text"].as_str().expect("text field");
    assert!(text.starts_with("<b>ERROR</b>"));
    assert!(text.contains("query &lt;slow&gt;"));

    let second = log_compat::init(Arc::clone(&handler) as Arc<dyn LogHandler>, LevelFilter::Info);
    assert!(second.is_err(), "the global logger is set once");
}
