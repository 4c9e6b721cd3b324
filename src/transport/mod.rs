//! Transport layer: one opaque credential string in, one out.
//!
//! The client only needs "send this credential, tagged with this caller
//! identity, within this deadline". [`Transport`] is that seam; the `grpc`
//! feature provides the tonic implementation.
//!
//! Implementations must allow concurrent `invoke` calls from several tasks on
//! one instance, each call independent of the others.

#[cfg(feature = "grpc")]
pub mod grpc;

#[cfg(feature = "grpc")]
pub mod tls;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// Raw reply of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    /// Signed reply credential.
    pub output: String,
    /// `false` means the node had no data for the call.
    pub status: bool,
}

/// A channel to one node endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `credential` with `caller` as call metadata, bounded by `timeout`.
    async fn invoke(
        &self,
        credential: String,
        caller: &str,
        timeout: Duration,
    ) -> Result<RpcReply, TransportError>;

    /// Release the channel. Calling it again is a no-op.
    async fn close(&self);
}
