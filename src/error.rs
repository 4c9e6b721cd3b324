//! Unified SDK error types.

use std::time::Duration;

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The node answered `status = false` for a call whose caller needs a value.
    #[error("No result returned for '{method}'")]
    NoResult { method: String },
}

impl SdkError {
    /// Whether retrying the same read-only call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Failure to establish the channel to a node endpoint.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Connect failed: {0}")]
    Connect(String),
}

/// Failure of a single call on an open channel.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("RPC status {code}: {message}")]
    Status { code: String, message: String },

    #[error("Connection closed")]
    Closed,

    #[error("Invalid call metadata: {0}")]
    InvalidMetadata(String),
}

impl TransportError {
    /// Status codes a caller can reasonably retry on.
    pub const RETRYABLE_CODES: &'static [&'static str] = &[
        "Unavailable",
        "ResourceExhausted",
        "Aborted",
        "DeadlineExceeded",
    ];

    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout(_) => true,
            TransportError::Status { code, .. } => Self::RETRYABLE_CODES.contains(&code.as_str()),
            TransportError::Closed | TransportError::InvalidMetadata(_) => false,
        }
    }
}

/// Failure to build the outbound credential.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("API key is empty")]
    EmptySecret,

    #[error("Token TTL {0:?} does not fit a Unix timestamp")]
    TtlOutOfRange(Duration),

    #[error("Params not serializable: {0}")]
    Params(#[from] serde_json::Error),

    #[error("Signing failed: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// The inbound credential could not be trusted.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Unexpected signing method: {0}")]
    AlgorithmMismatch(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Reply {field} mismatch: expected '{expected}', got '{actual}'")]
    EchoMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

/// A verified reply does not have the expected layout.
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("'{method}' returned an unexpected value, expected {expected}")]
    UnexpectedType {
        method: String,
        expected: &'static str,
    },

    #[error("Invalid hex quantity '{0}'")]
    InvalidHex(String),
}
