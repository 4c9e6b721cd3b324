//! Node domain: chains, remote method names, typed replies.

pub mod client;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ShapeError;

/// A JSON object returned verbatim by a node (block, producer list, …).
pub type RpcObject = Map<String, Value>;

// ─── Chain ───────────────────────────────────────────────────────────────────

/// Ledger a call is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Primary ledger.
    Mainchain,
    /// DID sidechain.
    Did,
    /// Token sidechain.
    Token,
    /// Ethereum-compatible sidechain; numeric quantities are hex strings.
    Eth,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Mainchain, Chain::Did, Chain::Token, Chain::Eth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainchain => "mainchain",
            Self::Did => "did",
            Self::Token => "token",
            Self::Eth => "eth",
        }
    }

    /// Whether heights and balances come back hex-encoded.
    pub fn is_eth(&self) -> bool {
        matches!(self, Self::Eth)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainchain" => Ok(Self::Mainchain),
            "did" => Ok(Self::Did),
            "token" => Ok(Self::Token),
            "eth" => Ok(Self::Eth),
            other => Err(format!("Unknown chain: {}", other)),
        }
    }
}

// ─── Method names ────────────────────────────────────────────────────────────

pub mod method {
    pub const GET_NODE_STATE: &str = "getnodestate";
    pub const GET_BLOCK_BY_HEIGHT: &str = "getblockbyheight";
    pub const GET_RECEIVED_BY_ADDRESS: &str = "getreceivedbyaddress";
    pub const LIST_CURRENT_CRS: &str = "listcurrentcrs";
    pub const LIST_CR_CANDIDATES: &str = "listcrcandidates";
    pub const LIST_PRODUCERS: &str = "listproducers";
    pub const GET_ARBITRATOR_GROUP_BY_HEIGHT: &str = "getarbitratorgroupbyheight";
    pub const GET_ARBITERS_INFO: &str = "getarbitersinfo";
    pub const GET_CONFIRM_BY_HEIGHT: &str = "getconfirmbyheight";
    pub const GET_MINING_INFO: &str = "getmininginfo";

    pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
    pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
    pub const ETH_GET_BALANCE: &str = "eth_getBalance";
}

// ─── Typed replies ───────────────────────────────────────────────────────────

/// Reply of `getnodestate`. Only `height` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// Nodes report the height as a JSON float.
    pub height: f64,
    #[serde(flatten)]
    pub extra: RpcObject,
}

impl NodeState {
    /// Height as a decimal string, no fraction.
    pub fn height_string(&self) -> String {
        format!("{:.0}", self.height)
    }
}

/// Balance of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Balance {
    /// Decimal amount of the chain's native asset.
    Amount(String),
    /// Token sidechain: asset id → decimal amount.
    Assets(HashMap<String, String>),
}

impl Balance {
    pub fn amount(&self) -> Option<&str> {
        match self {
            Balance::Amount(a) => Some(a),
            Balance::Assets(_) => None,
        }
    }
}

// ─── Reply shaping ───────────────────────────────────────────────────────────

pub(crate) fn expect_object(method: &str, value: Value) -> Result<RpcObject, ShapeError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(unexpected(method, "an object")),
    }
}

pub(crate) fn expect_string(method: &str, value: Value) -> Result<String, ShapeError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(unexpected(method, "a string")),
    }
}

pub(crate) fn expect_asset_map(
    method: &str,
    value: Value,
) -> Result<HashMap<String, String>, ShapeError> {
    expect_object(method, value)?
        .into_iter()
        .map(|(asset, amount)| match amount {
            Value::String(s) => Ok((asset, s)),
            _ => Err(unexpected(method, "a map of string amounts")),
        })
        .collect()
}

pub(crate) fn expect_node_state(method: &str, value: Value) -> Result<NodeState, ShapeError> {
    serde_json::from_value(value)
        .map_err(|_| unexpected(method, "a node state with a numeric height"))
}

fn unexpected(method: &str, expected: &'static str) -> ShapeError {
    ShapeError::UnexpectedType {
        method: method.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_wire_names() {
        for chain in Chain::ALL {
            let json = serde_json::to_string(&chain).unwrap();
            assert_eq!(json, format!("\"{}\"", chain.as_str()));
            assert_eq!(chain.as_str().parse::<Chain>().unwrap(), chain);
        }
        assert!("ethereum".parse::<Chain>().is_err());
    }

    #[test]
    fn test_node_state_height_string() {
        let state = expect_node_state(
            method::GET_NODE_STATE,
            json!({"height": 12345.0, "compile": "v0.7.0"}),
        )
        .unwrap();
        assert_eq!(state.height_string(), "12345");
        assert_eq!(state.extra.get("compile"), Some(&json!("v0.7.0")));
    }

    #[test]
    fn test_node_state_without_height_is_rejected() {
        let err = expect_node_state(method::GET_NODE_STATE, json!({"neighbors": []})).unwrap_err();
        assert!(matches!(err, ShapeError::UnexpectedType { .. }));
    }

    #[test]
    fn test_expect_asset_map() {
        let assets = expect_asset_map(
            method::GET_RECEIVED_BY_ADDRESS,
            json!({"a3d0eaa466df74983b5d7c543de6904f4c9418ead5ffd6d25814234a96db37b0": "10.5"}),
        )
        .unwrap();
        assert_eq!(assets.len(), 1);

        let err = expect_asset_map(method::GET_RECEIVED_BY_ADDRESS, json!({"x": 1})).unwrap_err();
        assert!(matches!(err, ShapeError::UnexpectedType { .. }));
    }

    #[test]
    fn test_balance_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(Balance::Amount("26".into())).unwrap(),
            json!("26")
        );
        assert_eq!(Balance::Amount("26".into()).amount(), Some("26"));
    }
}
