//! gRPC transport: `GrpcTransport` over a tonic `Channel`.
//!
//! The node exposes a single unary method taking one string and returning a
//! string plus a status flag. The channel is HTTP/2, so concurrent calls from
//! several tasks are multiplexed over the one connection.

use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

use async_lock::RwLock;
use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::http::Uri;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::error::{ConnectionError, TransportError};
use crate::transport::{tls, RpcReply, Transport};

/// Full path of the node's RPC method.
pub const RPC_METHOD_PATH: &str = "/node_rpc.NodeRpc/RpcMethod";

/// Metadata key carrying the caller identity.
pub const CALLER_METADATA_KEY: &str = "did";

// ─── Wire messages ───────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, prost::Message)]
pub struct RpcRequest {
    #[prost(string, tag = "1")]
    pub input: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RpcResponse {
    #[prost(string, tag = "1")]
    pub output: String,
    #[prost(bool, tag = "2")]
    pub status: bool,
}

// ─── GrpcTransport ───────────────────────────────────────────────────────────

/// Channel to one node endpoint. Endpoint and security mode are fixed at open.
pub struct GrpcTransport {
    address: String,
    secure: bool,
    channel: RwLock<Option<Channel>>,
}

impl GrpcTransport {
    /// Connect to `host:port`, failing if the channel cannot be established.
    ///
    /// `secure = false` is plaintext HTTP/2; `secure = true` is TLS without
    /// certificate identity checks.
    pub async fn open(
        host: &str,
        port: u16,
        secure: bool,
        connect_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let endpoint = endpoint(host, port, connect_timeout)?;

        let connector = if secure {
            Some(tls::insecure_connector()?)
        } else {
            None
        };

        let connecting = async {
            let connected = match connector {
                Some(connector) => {
                    let host = host.to_string();
                    endpoint
                        .connect_with_connector(tower::service_fn(move |_: Uri| {
                            tls::connect(connector.clone(), host.clone(), port)
                        }))
                        .await
                }
                None => endpoint.connect().await,
            };
            connected.map_err(|e| ConnectionError::Connect(format!("{}: {}", endpoint.uri(), e)))
        };

        let channel = tokio::time::timeout(connect_timeout, connecting)
            .await
            .map_err(|_| {
                ConnectionError::Connect(format!(
                    "{}:{}: timed out after {:?}",
                    host, port, connect_timeout
                ))
            })??;

        tracing::info!(host, port, secure, "Connected to node RPC endpoint");
        Ok(Self::from_channel(host, port, secure, channel))
    }

    /// Like [`open`](Self::open) but connects on first use.
    pub fn open_lazy(
        host: &str,
        port: u16,
        secure: bool,
        connect_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let endpoint = endpoint(host, port, connect_timeout)?;

        let channel = if secure {
            let connector = tls::insecure_connector()?;
            let host = host.to_string();
            endpoint.connect_with_connector_lazy(tower::service_fn(move |_: Uri| {
                tls::connect(connector.clone(), host.clone(), port)
            }))
        } else {
            endpoint.connect_lazy()
        };

        tracing::info!(host, port, secure, "Prepared lazy node RPC channel");
        Ok(Self::from_channel(host, port, secure, channel))
    }

    fn from_channel(host: &str, port: u16, secure: bool, channel: Channel) -> Self {
        Self {
            address: authority(host, port),
            secure,
            channel: RwLock::new(Some(channel)),
        }
    }

    /// `host:port` of the endpoint.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub async fn is_closed(&self) -> bool {
        self.channel.read().await.is_none()
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn invoke(
        &self,
        credential: String,
        caller: &str,
        timeout: Duration,
    ) -> Result<RpcReply, TransportError> {
        let channel = self
            .channel
            .read()
            .await
            .clone()
            .ok_or(TransportError::Closed)?;

        let did = MetadataValue::try_from(caller).map_err(|e| {
            TransportError::InvalidMetadata(format!("{}: {}", CALLER_METADATA_KEY, e))
        })?;

        let mut request = tonic::Request::new(RpcRequest { input: credential });
        request.metadata_mut().insert(CALLER_METADATA_KEY, did);
        request.set_timeout(timeout);

        let started = Instant::now();
        let call = async move {
            let mut grpc = Grpc::new(channel);
            grpc.ready().await.map_err(|e| TransportError::Status {
                code: format!("{:?}", Code::Unavailable),
                message: e.to_string(),
            })?;
            let codec: ProstCodec<RpcRequest, RpcResponse> = ProstCodec::default();
            grpc.unary(request, PathAndQuery::from_static(RPC_METHOD_PATH), codec)
                .await
                .map_err(|status| status_error(status, timeout, started.elapsed()))
        };

        let response = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;

        let body = response.into_inner();
        Ok(RpcReply {
            output: body.output,
            status: body.status,
        })
    }

    async fn close(&self) {
        if self.channel.write().await.take().is_some() {
            tracing::info!(address = %self.address, "Closed node RPC channel");
        }
    }
}

/// `host:port`, with IPv6 literals bracketed.
fn authority(host: &str, port: u16) -> String {
    match host.parse::<Ipv6Addr>() {
        Ok(_) => format!("[{}]:{}", host, port),
        Err(_) => format!("{}:{}", host, port),
    }
}

fn endpoint(host: &str, port: u16, connect_timeout: Duration) -> Result<Endpoint, ConnectionError> {
    // TLS, when used, is layered underneath by the connector.
    let uri = format!("http://{}", authority(host, port));
    Endpoint::from_shared(uri.clone())
        .map(|e| e.connect_timeout(connect_timeout))
        .map_err(|e| ConnectionError::InvalidEndpoint(format!("{}: {}", uri, e)))
}

/// Map a failed call's status. tonic's own deadline timer surfaces as
/// `Cancelled`, so a cancellation at or past the deadline is a timeout.
fn status_error(status: Status, timeout: Duration, elapsed: Duration) -> TransportError {
    match status.code() {
        Code::DeadlineExceeded => TransportError::Timeout(timeout),
        Code::Cancelled if elapsed >= timeout => TransportError::Timeout(timeout),
        code => TransportError::Status {
            code: format!("{:?}", code),
            message: status.message().to_string(),
        },
    }
}
