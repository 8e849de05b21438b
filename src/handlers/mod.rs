//! Handler builders and associated traits.
//!
//! Provides a builder API for constructing handlers in a type‑safe manner.
//! Each builder implements [`HandlerBuilderTrait`], validating its settings
//! before the handler and its worker thread are created.

use std::io;

use thiserror::Error;

pub mod telegram_builder;

pub use telegram_builder::TelegramHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the handler.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    /// Concrete handler produced by the builder.
    type Handler;

    /// Validate the configuration and build the handler instance.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;
}
