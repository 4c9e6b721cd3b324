//! Endpoint and timing constants for the Adenine node RPC service.

use std::time::Duration;

/// Default node RPC host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default node RPC port.
pub const DEFAULT_PORT: u16 = 8001;

/// Main network identifier.
pub const MAINNET: &str = "mainnet";

/// Test network identifier.
pub const TESTNET: &str = "testnet";

/// Lifetime of an outbound credential.
pub const TOKEN_TTL: Duration = Duration::from_secs(30);

/// Deadline for one remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for establishing the channel.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
