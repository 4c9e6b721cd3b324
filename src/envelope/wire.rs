//! Claim layouts carried inside the signed tokens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claim key holding the call descriptor (outbound) or the reply (inbound).
pub const JWT_INFO: &str = "jwt_info";

/// Key inside the inbound `jwt_info` object holding the call's value.
pub const RESULT: &str = "result";

/// Claims of an outbound credential.
///
/// `jwt_info` is the call descriptor serialized to a JSON string, not a
/// nested object; the node parses it a second time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundClaims {
    pub jwt_info: String,
    /// Unix seconds.
    pub exp: i64,
}

/// Claims of a reply credential. `exp` is checked by the verifier when present.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InboundClaims {
    #[serde(default)]
    pub jwt_info: Option<Value>,
}
