//! Error types for the subscriber API client.
//!
//! # Design
//! The remote service reports application failures in the response body and
//! status code, which the client hands back untouched inside `ApiResponse`.
//! `ApiError` therefore only covers what happens locally: the transport
//! failing, a body that is not JSON, and identity resolution failing before
//! the primary request is sent.

use thiserror::Error;

/// Errors returned by `BossClient` and `BlockingBossClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, timeout, body read).
    #[error("transport failed: {0}")]
    TransportError(String),

    /// The response body could not be decoded as JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Neither a subscriber id nor an IMSI was supplied.
    #[error("no subscriber id or IMSI supplied")]
    MissingIdentifier,

    /// The lookup-by-IMSI step did not yield a subscriber id.
    #[error("could not resolve subscriber for IMSI {imsi}: {reason}")]
    ResolutionError { imsi: u64, reason: String },

    #[error("missing configuration: {0}")]
    ConfigError(String),
}
