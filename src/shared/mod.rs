//! Shared newtypes and utilities used across the envelope, client and facade.

pub mod fmt;

pub use fmt::hex::{hex_to_decimal, to_hex_quantity};

use std::fmt as stdfmt;

// ─── ApiKey ──────────────────────────────────────────────────────────────────

/// Shared secret that signs outbound credentials and verifies replies.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl stdfmt::Debug for ApiKey {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── CallContext ─────────────────────────────────────────────────────────────

/// Per-caller values that travel with every call.
///
/// One client serves any number of contexts, each with its own key.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub api_key: ApiKey,
    /// Caller identity (a DID), sent as call metadata outside the signed payload.
    pub did: String,
    pub network: String,
}

impl CallContext {
    pub fn new(api_key: impl Into<ApiKey>, did: &str, network: &str) -> Self {
        Self {
            api_key: api_key.into(),
            did: did.to_string(),
            network: network.to_string(),
        }
    }
}
