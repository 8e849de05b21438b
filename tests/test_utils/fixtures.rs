//! Fixtures pairing a [`SharedBuf`] with a stream-backed Telegram handler,
//! so handlers can be exercised without network access.

use rstest::fixture;
use telegram_logging::{TelegramHandler, TelegramHandlerBuilder};

use super::shared_buffer::SharedBuf;

/// Token used by every fixture; it must never appear in output.
pub const TOKEN: &str = "987654:fixture-token";

/// Builder configured with the fixture token and two chats.
#[fixture]
pub fn builder() -> TelegramHandlerBuilder {
    TelegramHandlerBuilder::new()
        .with_token(TOKEN)
        .with_chat_ids([-100_i64, 200])
}

/// Handler writing JSON request lines into a fresh buffer.
#[fixture]
pub fn stream_handler(builder: TelegramHandlerBuilder) -> (SharedBuf, TelegramHandler) {
    let buffer = SharedBuf::default();
    let handler = builder
        .build_stream(buffer.clone())
        .expect("stream handler builds");
    (buffer, handler)
}
