//! stacks-client: Read channel to the ledger API
//!
//! This crate provides the [`LedgerReader`] seam used by discovery, and an
//! HTTP implementation with per-request timeouts.

pub mod queries;

use std::time::Duration;

use amm_core::{ContractId, NetworkError, NodeConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use queries::{
    ContractEvent, ContractLog, EventPage, LogValue, NodeInfo, ReadOnlyCall, ReadOnlyResponse,
};

/// Result type for ledger client operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Read-only access to the ledger. Implementations must be safe to share
/// across concurrent probes.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// One page of a contract's event log
    async fn contract_events(&self, contract: &ContractId, offset: u64, limit: u64)
        -> Result<EventPage>;

    /// Execute a read-only call, returning the raw encoded result
    async fn call_read_only(&self, call: &ReadOnlyCall) -> Result<Vec<u8>>;
}

/// HTTP ledger client
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    config: NodeConfig,
}

impl LedgerClient {
    /// Create a client. Does not touch the network.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("pool-scout")
            .build()
            .map_err(|e| NetworkError::Unreachable {
                url: config.url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { http, config })
    }

    /// Get the current connection configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// Node status from `/v2/info`
    pub async fn node_info(&self) -> Result<NodeInfo> {
        self.get_json("/v2/info").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = timed_request(self.timeout(), self.http.get(&url).send()).await?;
        read_json(response, &url).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let response = timed_request(self.timeout(), self.http.post(&url).json(body).send()).await?;
        read_json(response, &url).await
    }
}

#[async_trait]
impl LedgerReader for LedgerClient {
    async fn contract_events(
        &self,
        contract: &ContractId,
        offset: u64,
        limit: u64,
    ) -> Result<EventPage> {
        let path = queries::contract_events_path(contract, offset, limit);
        tracing::debug!(contract = %contract, offset, limit, "Fetching event page");
        self.get_json(&path).await
    }

    async fn call_read_only(&self, call: &ReadOnlyCall) -> Result<Vec<u8>> {
        let path = queries::read_only_path(call);
        let response: ReadOnlyResponse = self.post_json(&path, &call.body()).await?;
        response.into_bytes(&call.function_name)
    }
}

/// Wrap a request with a timeout. Converts both timeout and transport errors to NetworkError.
async fn timed_request(
    timeout: Duration,
    fut: impl std::future::Future<Output = reqwest::Result<reqwest::Response>>,
) -> Result<reqwest::Response> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| NetworkError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(|e| NetworkError::Unreachable {
            url: e
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: e.to_string(),
        })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    response
        .json()
        .await
        .map_err(|e| NetworkError::ParseError(format!("{}: {}", url, e)))
}
