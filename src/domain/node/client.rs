//! Node sub-clients: per-chain queries and mainchain-only queries.
//!
//! Each query picks a method name, shapes its params, goes through
//! [`NodeRpcClient::rpc_method`], then unwraps the reply for its chain: the
//! eth sidechain answers heights and balances in hex, the others in decimal.

use serde_json::{json, Value};

use crate::client::NodeRpcClient;
use crate::domain::node::{
    expect_asset_map, expect_node_state, expect_object, expect_string, method, Balance, Chain,
    NodeState, RpcObject,
};
use crate::envelope::Params;
use crate::error::SdkError;
use crate::shared::{hex_to_decimal, to_hex_quantity, CallContext};

/// Sub-client for queries served by every chain.
pub struct ChainQueries<'a> {
    pub(crate) client: &'a NodeRpcClient,
    pub(crate) ctx: &'a CallContext,
    pub(crate) chain: Chain,
}

impl<'a> ChainQueries<'a> {
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Node state (`getnodestate`). Not served by the eth sidechain.
    pub async fn current_node_state(&self) -> Result<NodeState, SdkError> {
        if self.chain.is_eth() {
            return Err(SdkError::Validation(format!(
                "{} is not served by the {} chain",
                method::GET_NODE_STATE,
                self.chain
            )));
        }
        let value = self.call(method::GET_NODE_STATE, Params::empty()).await?;
        Ok(expect_node_state(method::GET_NODE_STATE, value)?)
    }

    /// Current block height as a decimal string.
    pub async fn current_height(&self) -> Result<String, SdkError> {
        if self.chain.is_eth() {
            let value = self.call(method::ETH_BLOCK_NUMBER, Params::empty()).await?;
            let hex = expect_string(method::ETH_BLOCK_NUMBER, value)?;
            return Ok(hex_to_decimal(&hex)?);
        }
        Ok(self.current_node_state().await?.height_string())
    }

    /// Block at the current height. Two calls: the second needs the first's height.
    pub async fn current_block_info(&self) -> Result<RpcObject, SdkError> {
        let height = self.current_height().await?;
        self.block_info(&height).await
    }

    /// Block at `height` (decimal string), returned verbatim.
    pub async fn block_info(&self, height: &str) -> Result<RpcObject, SdkError> {
        let (name, params) = if self.chain.is_eth() {
            let height = parse_height(height)?;
            (
                method::ETH_GET_BLOCK_BY_NUMBER,
                Params::seq([json!(to_hex_quantity(height)), json!(true)]),
            )
        } else {
            (
                method::GET_BLOCK_BY_HEIGHT,
                Params::map([("height", json!(height))]),
            )
        };
        let value = self.call(name, params).await?;
        Ok(expect_object(name, value)?)
    }

    /// Balance received by `address`.
    ///
    /// The token sidechain answers per asset; other chains answer one amount.
    pub async fn current_balance(&self, address: &str) -> Result<Balance, SdkError> {
        match self.chain {
            Chain::Eth => {
                let params = Params::seq([json!(address), json!("latest")]);
                let value = self.call(method::ETH_GET_BALANCE, params).await?;
                let hex = expect_string(method::ETH_GET_BALANCE, value)?;
                Ok(Balance::Amount(hex_to_decimal(&hex)?))
            }
            Chain::Token => {
                let params = Params::map([("address", json!(address))]);
                let value = self.call(method::GET_RECEIVED_BY_ADDRESS, params).await?;
                Ok(Balance::Assets(expect_asset_map(method::GET_RECEIVED_BY_ADDRESS, value)?))
            }
            Chain::Mainchain | Chain::Did => {
                let params = Params::map([("address", json!(address))]);
                let value = self.call(method::GET_RECEIVED_BY_ADDRESS, params).await?;
                Ok(Balance::Amount(expect_string(method::GET_RECEIVED_BY_ADDRESS, value)?))
            }
        }
    }

    async fn call(&self, name: &str, params: Params) -> Result<Value, SdkError> {
        fetch(self.client, self.ctx, self.chain, name, params).await
    }
}

/// Sub-client for queries only the primary ledger serves.
pub struct Mainchain<'a> {
    pub(crate) client: &'a NodeRpcClient,
    pub(crate) ctx: &'a CallContext,
}

impl<'a> Mainchain<'a> {
    /// The common queries, addressed to the mainchain.
    pub fn queries(&self) -> ChainQueries<'a> {
        ChainQueries {
            client: self.client,
            ctx: self.ctx,
            chain: Chain::Mainchain,
        }
    }

    /// Current CR council members.
    pub async fn current_crc_council(&self) -> Result<RpcObject, SdkError> {
        self.object(method::LIST_CURRENT_CRS, Params::map([("state", json!("all"))]))
            .await
    }

    /// CR council candidates in every state.
    pub async fn current_crc_candidates(&self) -> Result<RpcObject, SdkError> {
        self.object(method::LIST_CR_CANDIDATES, list_all()).await
    }

    /// DPoS supernodes (producers) in every state.
    pub async fn current_dpos_supernodes(&self) -> Result<RpcObject, SdkError> {
        self.object(method::LIST_PRODUCERS, list_all()).await
    }

    pub async fn current_arbitrator_group(&self) -> Result<RpcObject, SdkError> {
        let height = self.queries().current_height().await?;
        self.arbitrator_group(&height).await
    }

    /// Arbitrator group at `height` (decimal string, sent as a string).
    pub async fn arbitrator_group(&self, height: &str) -> Result<RpcObject, SdkError> {
        self.object(
            method::GET_ARBITRATOR_GROUP_BY_HEIGHT,
            Params::map([("height", json!(height))]),
        )
        .await
    }

    pub async fn current_arbitrators_info(&self) -> Result<RpcObject, SdkError> {
        self.object(method::GET_ARBITERS_INFO, Params::empty()).await
    }

    pub async fn current_block_confirm(&self) -> Result<RpcObject, SdkError> {
        let height = self.queries().current_height().await?;
        self.block_confirm(&height).await
    }

    /// Block confirmation at `height` (decimal string, sent as an integer).
    pub async fn block_confirm(&self, height: &str) -> Result<RpcObject, SdkError> {
        let height = parse_height(height)?;
        self.object(
            method::GET_CONFIRM_BY_HEIGHT,
            Params::map([("height", json!(height)), ("verbosity", json!(1))]),
        )
        .await
    }

    pub async fn current_mining_info(&self) -> Result<RpcObject, SdkError> {
        self.object(method::GET_MINING_INFO, Params::empty()).await
    }

    async fn object(&self, name: &str, params: Params) -> Result<RpcObject, SdkError> {
        let value = fetch(self.client, self.ctx, Chain::Mainchain, name, params).await?;
        Ok(expect_object(name, value)?)
    }
}

/// Run one call; a "no data" reply is an error here since every query needs a value.
async fn fetch(
    client: &NodeRpcClient,
    ctx: &CallContext,
    chain: Chain,
    name: &str,
    params: Params,
) -> Result<Value, SdkError> {
    client
        .rpc_method(ctx, chain, name, params)
        .await?
        .ok_or_else(|| SdkError::NoResult {
            method: name.to_string(),
        })
}

fn list_all() -> Params {
    Params::map([("start", json!(0)), ("state", json!("all"))])
}

fn parse_height(height: &str) -> Result<u64, SdkError> {
    height
        .trim()
        .parse::<u64>()
        .map_err(|_| SdkError::Validation(format!("Invalid block height: '{}'", height)))
}
