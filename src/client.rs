//! High-level client: `NodeRpcClient` with nested sub-client accessors.
//!
//! The node queries live in `domain/node/client.rs`. This module keeps the
//! builder, the shared transport, and the signed call path every query goes
//! through: encode → invoke → decode.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::node::client::{ChainQueries, Mainchain};
use crate::domain::node::Chain;
use crate::envelope::{self, CallDescriptor, Params};
use crate::error::SdkError;
use crate::network;
use crate::retry::RetryPolicy;
use crate::shared::CallContext;
use crate::transport::Transport;

// Re-export sub-client types for convenience.
pub use crate::domain::node::client::ChainQueries as ChainClient;
pub use crate::domain::node::client::Mainchain as MainchainClient;

/// The primary entry point for the SDK.
///
/// Holds one channel to one node endpoint, shared by every call and every
/// clone of the client. Per-caller secrets travel in a [`CallContext`].
pub struct NodeRpcClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) request_timeout: Duration,
    pub(crate) token_ttl: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) verify_echo: bool,
}

impl NodeRpcClient {
    pub fn builder() -> NodeRpcClientBuilder {
        NodeRpcClientBuilder::default()
    }

    /// Connect to `host:port` with default settings.
    ///
    /// `production = true` selects TLS without certificate identity checks.
    #[cfg(feature = "grpc")]
    pub async fn connect(host: &str, port: u16, production: bool) -> Result<Self, SdkError> {
        Self::builder()
            .host(host)
            .port(port)
            .production(production)
            .connect()
            .await
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    /// Queries every chain serves.
    pub fn chain<'a>(&'a self, ctx: &'a CallContext, chain: Chain) -> ChainQueries<'a> {
        ChainQueries {
            client: self,
            ctx,
            chain,
        }
    }

    /// Primary-ledger-only queries.
    pub fn mainchain<'a>(&'a self, ctx: &'a CallContext) -> Mainchain<'a> {
        Mainchain { client: self, ctx }
    }

    // ── Signed call path ─────────────────────────────────────────────────

    /// Call `method` on `chain` and return the verified `result`.
    ///
    /// `Ok(None)` means the node answered with `status = false` (no data).
    pub async fn rpc_method(
        &self,
        ctx: &CallContext,
        chain: Chain,
        method: &str,
        params: Params,
    ) -> Result<Option<Value>, SdkError> {
        let call = CallDescriptor::new(&ctx.network, chain, method, params);
        let span = tracing::info_span!(
            "rpc_method",
            request_id = %Uuid::new_v4(),
            method,
            chain = %chain,
            network = %ctx.network,
        );

        async {
            let Some(config) = self.retry.config() else {
                return self.call_once(ctx, &call).await;
            };

            let mut attempt = 0;
            loop {
                match self.call_once(ctx, &call).await {
                    Ok(value) => return Ok(value),
                    Err(e) if attempt < config.max_retries && config.should_retry(&e) => {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retrying {}",
                            call.method
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        .instrument(span)
        .await
    }

    /// One attempt. Signs a fresh credential so retries never resend an
    /// expired one.
    async fn call_once(
        &self,
        ctx: &CallContext,
        call: &CallDescriptor,
    ) -> Result<Option<Value>, SdkError> {
        let credential = envelope::encode(&ctx.api_key, call, self.token_ttl)?;
        tracing::debug!(ttl_secs = self.token_ttl.as_secs(), "Signed credential");

        let reply = self
            .transport
            .invoke(credential, &ctx.did, self.request_timeout)
            .await?;
        tracing::debug!(status = reply.status, "Received reply");

        let decoded = if self.verify_echo {
            envelope::decode_for(&ctx.api_key, &reply.output, reply.status, call)
        } else {
            envelope::decode(&ctx.api_key, &reply.output, reply.status)
        };

        match &decoded {
            Ok(Some(_)) => tracing::debug!("Verified reply"),
            Ok(None) => tracing::debug!("Node returned no data"),
            Err(e) => tracing::warn!(error = %e, "Rejected reply"),
        }
        decoded
    }

    /// Release the channel. Later calls fail with
    /// [`TransportError::Closed`](crate::error::TransportError::Closed).
    pub async fn close(&self) {
        self.transport.close().await;
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl Clone for NodeRpcClient {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            request_timeout: self.request_timeout,
            token_ttl: self.token_ttl,
            retry: self.retry.clone(),
            verify_echo: self.verify_echo,
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct NodeRpcClientBuilder {
    host: String,
    port: u16,
    production: bool,
    lazy: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
    token_ttl: Duration,
    retry: RetryPolicy,
    verify_echo: bool,
}

impl Default for NodeRpcClientBuilder {
    fn default() -> Self {
        Self {
            host: network::DEFAULT_HOST.to_string(),
            port: network::DEFAULT_PORT,
            production: false,
            lazy: false,
            connect_timeout: network::CONNECT_TIMEOUT,
            request_timeout: network::REQUEST_TIMEOUT,
            token_ttl: network::TOKEN_TTL,
            retry: RetryPolicy::None,
            verify_echo: true,
        }
    }
}

impl NodeRpcClientBuilder {
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use TLS (without certificate identity checks) instead of plaintext.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Defer connecting until the first call.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Require echoed method/chain/network in replies to match the request.
    pub fn verify_echo(mut self, verify: bool) -> Self {
        self.verify_echo = verify;
        self
    }

    /// Open the gRPC channel and build the client.
    #[cfg(feature = "grpc")]
    pub async fn connect(self) -> Result<NodeRpcClient, SdkError> {
        use crate::transport::grpc::GrpcTransport;

        let transport = if self.lazy {
            GrpcTransport::open_lazy(&self.host, self.port, self.production, self.connect_timeout)?
        } else {
            GrpcTransport::open(&self.host, self.port, self.production, self.connect_timeout)
                .await?
        };
        Ok(self.build_with_transport(Arc::new(transport)))
    }

    /// Build the client over an already-open transport.
    pub fn build_with_transport(self, transport: Arc<dyn Transport>) -> NodeRpcClient {
        NodeRpcClient {
            transport,
            request_timeout: self.request_timeout,
            token_ttl: self.token_ttl,
            retry: self.retry,
            verify_echo: self.verify_echo,
        }
    }
}
