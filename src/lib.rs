//! # Adenine SDK
//!
//! A Rust client for Elastos node RPC through an Adenine gRPC endpoint.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Errors, constants, shared newtypes, the signed envelope and
//!    node domain types (always available)
//! 2. **Transport**: `Transport` trait; `GrpcTransport` over tonic, plain or
//!    TLS without certificate identity checks (`grpc` feature)
//! 3. **Client**: `NodeRpcClient` with the signed call path and retry policies
//! 4. **Queries**: per-chain and mainchain-only sub-clients
//!
//! Every call is a single HS256 token carrying network, chain, method and
//! params, signed with the caller's API key; the reply is a token signed with
//! the same key and is only read after it verifies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adenine_sdk::prelude::*;
//!
//! let client = NodeRpcClient::builder()
//!     .host("localhost")
//!     .port(8001)
//!     .connect()
//!     .await?;
//!
//! let ctx = CallContext::new(api_key, did, MAINNET);
//! let height = client.chain(&ctx, Chain::Eth).current_height().await?;
//! let council = client.mainchain(&ctx).current_crc_council().await?;
//! client.close().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and number formatting.
pub mod shared;

/// Domain modules: node chains, typed replies, query sub-clients.
pub mod domain;

/// Signed request/response envelope.
pub mod envelope;

/// Unified SDK error types.
pub mod error;

/// Endpoint and timing constants.
pub mod network;

// ── Layer 2: Transport ───────────────────────────────────────────────────────

/// Channel abstraction and the gRPC implementation.
pub mod transport;

// ── Layer 3: Client ──────────────────────────────────────────────────────────

/// Retry policies for read-only calls.
pub mod retry;

/// `NodeRpcClient`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{ApiKey, CallContext};

    // Envelope
    pub use crate::envelope::{CallDescriptor, Params};

    // Domain types: node
    pub use crate::domain::node::{Balance, Chain, NodeState, RpcObject};

    // Errors
    pub use crate::error::{
        AuthError, ConnectionError, EncodingError, SdkError, ShapeError, TransportError,
    };

    // Network
    pub use crate::network::{DEFAULT_HOST, DEFAULT_PORT, MAINNET, TESTNET};

    // Client + sub-clients
    pub use crate::client::{ChainClient, MainchainClient, NodeRpcClient, NodeRpcClientBuilder};
    pub use crate::retry::{RetryConfig, RetryPolicy};

    // Transport
    pub use crate::transport::{RpcReply, Transport};
    #[cfg(feature = "grpc")]
    pub use crate::transport::grpc::GrpcTransport;
}
