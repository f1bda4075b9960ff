use amm_core::TokenRef;
use serde::Serialize;

use crate::AppState;

/// Response for the node status command
#[derive(Debug, Serialize)]
pub struct NodeStatusResponse {
    pub connected: bool,
    pub url: String,
    pub network: String,
    pub chain_height: u64,
    pub burn_height: Option<u64>,
    pub server_version: Option<String>,
}

/// Probe the configured ledger API
pub async fn get_node_status(state: &AppState) -> NodeStatusResponse {
    let client = state.client();
    let mut response = NodeStatusResponse {
        connected: false,
        url: client.config().url.clone(),
        network: state.config.network.as_str().to_string(),
        chain_height: 0,
        burn_height: None,
        server_version: None,
    };
    match client.node_info().await {
        Ok(info) => {
            response.connected = true;
            response.chain_height = info.stacks_tip_height;
            response.burn_height = Some(info.burn_block_height);
            response.server_version = info.server_version;
        }
        Err(e) => tracing::warn!(url = %response.url, "Node unreachable: {}", e),
    }
    response
}

/// Response for a token balance lookup
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub token: TokenRef,
    pub account: String,
    pub decimals: u8,
    pub balance: String,
    pub balance_base: u128,
}

pub async fn get_token_balance(
    state: &AppState,
    token: TokenRef,
    account: String,
) -> anyhow::Result<BalanceResponse> {
    let decimals = state.reader.get_decimals(&token).await?;
    let balance = state.reader.get_balance(&token, &account).await?;
    Ok(BalanceResponse {
        balance: amm::format_base_units(balance, u32::from(decimals)),
        balance_base: balance,
        token,
        account,
        decimals,
    })
}
