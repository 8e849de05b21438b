//! Delivery of single messages to the Bot API.
//!
//! [`TelegramClient`] merges the configured [`DeliveryParameters`] into each
//! request, hands the payload to a [`Delivery`] implementation and reports
//! the outcome as a diagnostic warning. Every outcome is terminal: nothing
//! here retries, and no failure is propagated to the caller as a panic.

use std::sync::Arc;

use log::warn;
use serde_json::{Map, Value};
use ureq::{Agent, AgentBuilder, Proxy};

use crate::handlers::HandlerBuildError;

use super::{
    chat::ChatId,
    config::{TelegramHandlerConfig, redact_token},
    params::DeliveryParameters,
};

/// Result of one `sendMessage` attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The API accepted the message.
    Delivered,
    /// The HTTP response status was not 2xx.
    HttpStatus { status: u16, body: String },
    /// The API answered `ok: false`.
    Rejected { description: String },
    /// The response did not have the expected shape.
    Unexpected(String),
    /// The request never produced a response (DNS, connect, I/O).
    Transport(String),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }

    /// Log a warning describing a failed outcome.
    pub fn report(&self, chat_id: &ChatId) {
        match self {
            SendOutcome::Delivered => {}
            SendOutcome::HttpStatus { status, body } => {
                warn!("Request to Telegram got error with code {status}; response is: {body}");
            }
            SendOutcome::Rejected { description } => {
                warn!("Failed to send log message to chat {chat_id}: {description}");
            }
            SendOutcome::Unexpected(raw) => {
                warn!("Unexpected response from Telegram: {raw}");
            }
            SendOutcome::Transport(err) => {
                warn!("Request to Telegram for chat {chat_id} failed: {err}");
            }
        }
    }
}

/// Interpret the body of a 2xx `sendMessage` response.
pub fn interpret_response(body: &str) -> SendOutcome {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return SendOutcome::Unexpected(body.to_owned());
    };
    match value.get("ok").and_then(Value::as_bool) {
        Some(true) => SendOutcome::Delivered,
        Some(false) => match value.get("description").and_then(Value::as_str) {
            Some(description) => SendOutcome::Rejected {
                description: description.to_owned(),
            },
            None => SendOutcome::Unexpected(body.to_owned()),
        },
        None => SendOutcome::Unexpected(body.to_owned()),
    }
}

/// Transport for fully built `sendMessage` payloads.
///
/// Implemented by [`HttpDelivery`] for the real API and by
/// [`StreamDelivery`](super::StreamDelivery) for local development.
pub trait Delivery: Send {
    /// Deliver one payload and classify the result.
    fn deliver(&mut self, payload: &Map<String, Value>) -> SendOutcome;
}

/// Delivery over HTTPS using a pooled `ureq` agent.
pub struct HttpDelivery {
    agent: Agent,
    endpoint: String,
    token: String,
}

impl HttpDelivery {
    /// Build the agent from timeouts, TLS and proxy settings in `config`.
    pub fn new(config: &TelegramHandlerConfig) -> Result<Self, HandlerBuildError> {
        let tls = native_tls::TlsConnector::new()
            .map_err(|err| HandlerBuildError::InvalidConfig(format!("TLS setup failed: {err}")))?;
        let mut builder = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.write_timeout)
            .tls_connector(Arc::new(tls));
        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::new(proxy).map_err(|err| {
                HandlerBuildError::InvalidConfig(format!("invalid proxy {proxy:?}: {err}"))
            })?;
            builder = builder.proxy(proxy);
        }
        Ok(Self {
            agent: builder.build(),
            endpoint: config.endpoint(),
            token: config.token.clone(),
        })
    }

    fn read_body(&self, response: ureq::Response) -> String {
        response
            .into_string()
            .unwrap_or_else(|err| format!("<unreadable body: {err}>"))
    }
}

impl Delivery for HttpDelivery {
    fn deliver(&mut self, payload: &Map<String, Value>) -> SendOutcome {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => return SendOutcome::Transport(format!("serialisation failed: {err}")),
        };
        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body);
        match result {
            Ok(response) => {
                let status = response.status();
                let body = self.read_body(response);
                if (200..300).contains(&status) {
                    interpret_response(&body)
                } else {
                    SendOutcome::HttpStatus { status, body }
                }
            }
            Err(ureq::Error::Status(status, response)) => SendOutcome::HttpStatus {
                status,
                body: self.read_body(response),
            },
            // Transport errors embed the URL, which contains the token.
            Err(ureq::Error::Transport(err)) => {
                SendOutcome::Transport(redact_token(&self.token, &err.to_string()))
            }
        }
    }
}

/// Sends text fragments to chats, one request per call.
pub struct TelegramClient {
    delivery: Box<dyn Delivery>,
    params: DeliveryParameters,
}

impl TelegramClient {
    pub fn new(delivery: Box<dyn Delivery>, params: DeliveryParameters) -> Self {
        Self { delivery, params }
    }

    /// Send `text` to `chat_id`. Failures are logged and returned, never
    /// raised.
    pub fn send(&mut self, chat_id: &ChatId, text: &str, parse_mode: Option<&str>) -> SendOutcome {
        let payload = self.params.message_payload(chat_id, text, parse_mode);
        let outcome = self.delivery.deliver(&payload);
        outcome.report(chat_id);
        outcome
    }
}
