//! Configuration types for pool-scout

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{constants::BPS_DENOMINATOR, ContractId, Error, FeeBps, Network, TokenRef, ValidationError};

/// Ledger API connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// API base URL (e.g., "https://api.hiro.so")
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "https://api.hiro.so".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Read-only function names exposed by the pool and token contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractFunctions {
    /// (token-a, token-b, fee) -> (optional (buff))
    pub get_pool_id: String,
    /// (pool-id) -> (optional pool-state-tuple)
    pub get_pool: String,
    /// (token-a, token-b, fee) -> bool
    pub pool_exists: String,
    /// SIP-010 () -> (response uint)
    pub get_decimals: String,
    /// SIP-010 (principal) -> (response uint)
    pub get_balance: String,
}

impl Default for ContractFunctions {
    fn default() -> Self {
        Self {
            get_pool_id: "get-pool-id".to_string(),
            get_pool: "get-pool".to_string(),
            pool_exists: "pool-exists".to_string(),
            get_decimals: "get-decimals".to_string(),
            get_balance: "get-balance".to_string(),
        }
    }
}

/// Target pool contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolContractConfig {
    /// Pool registry contract (`<address>.<name>`)
    pub contract: ContractId,

    /// Sender address used for read-only calls
    pub sender: String,

    #[serde(default)]
    pub functions: ContractFunctions,
}

impl Default for PoolContractConfig {
    fn default() -> Self {
        Self {
            contract: ContractId::new("SP000000000000000000002Q6VF78.amm-pool-v1"),
            sender: "SP000000000000000000002Q6VF78".to_string(),
            functions: ContractFunctions::default(),
        }
    }
}

/// Discovery run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Tokens swept pairwise as a scan-miss safeguard
    #[serde(default)]
    pub known_tokens: Vec<TokenRef>,

    /// Fee tiers (bps) swept for every known pair
    #[serde(default = "default_fee_tiers")]
    pub fee_tiers: Vec<FeeBps>,

    /// Concurrent existence probes during the sweep
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// Optional deadline for a whole discovery run
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_fee_tiers() -> Vec<FeeBps> {
    vec![30, 100, 500]
}

fn default_probe_concurrency() -> usize {
    8
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            known_tokens: Vec::new(),
            fee_tiers: default_fee_tiers(),
            probe_concurrency: default_probe_concurrency(),
            deadline_secs: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ledger API settings
    #[serde(default)]
    pub node: NodeConfig,

    /// Network (mainnet or testnet)
    #[serde(default = "default_network")]
    pub network: Network,

    /// Pool contract settings
    #[serde(default)]
    pub pools: PoolContractConfig,

    /// Discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

fn default_network() -> Network {
    Network::Mainnet
}

impl AppConfig {
    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: AppConfig = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks on identifiers and fee tiers
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pools.contract.split()?;
        if self.pools.sender.is_empty() || self.pools.sender.contains('.') {
            return Err(ValidationError::InvalidIdentifier {
                value: self.pools.sender.clone(),
                reason: "sender must be a standard address".to_string(),
            });
        }
        for token in &self.discovery.known_tokens {
            token.contract_id().split()?;
        }
        if let Some(fee) = self
            .discovery
            .fee_tiers
            .iter()
            .find(|fee| **fee > BPS_DENOMINATOR)
        {
            return Err(ValidationError::InvalidFee { fee: *fee });
        }
        Ok(())
    }

    /// [`validate`](Self::validate), then parse every principal through
    /// `address_version` (principal string to address version byte) and
    /// require each to belong to the configured network.
    pub fn validate_with<F>(&self, address_version: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Result<u8, String>,
    {
        self.validate()?;
        let check = |value: &str| -> Result<(), ValidationError> {
            let version =
                address_version(value).map_err(|reason| ValidationError::InvalidIdentifier {
                    value: value.to_string(),
                    reason,
                })?;
            if !self.network.accepts_version(version) {
                return Err(ValidationError::InvalidIdentifier {
                    value: value.to_string(),
                    reason: format!("address version {} is not a {} version", version, self.network),
                });
            }
            Ok(())
        };

        check(self.pools.contract.as_str())?;
        check(&self.pools.sender)?;
        for token in &self.discovery.known_tokens {
            check(token.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.node.url, "https://api.hiro.so");
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.discovery.probe_concurrency, 8);
        assert_eq!(config.pools.functions.get_pool_id, "get-pool-id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.node.url, config.node.url);
        assert_eq!(parsed.pools.contract, config.pools.contract);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = serde_json::from_str(
            r#"{"pools": {"contract": "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9.amm-pool-v2", "sender": "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9"},
                "discovery": {"fee_tiers": [30]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.network, Network::Mainnet);
        assert_eq!(parsed.discovery.fee_tiers, vec![30]);
        assert_eq!(parsed.pools.functions.get_pool, "get-pool");
        assert_eq!(parsed.node.request_timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_fee() {
        let mut config = AppConfig::default();
        config.discovery.fee_tiers = vec![30, 10_001];
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidFee { fee: 10_001 })
        );
    }

    fn prefix_version(s: &str) -> Result<u8, String> {
        match s.get(..2) {
            Some("SP") => Ok(22),
            Some("ST") => Ok(26),
            _ => Err("not an address".to_string()),
        }
    }

    #[test]
    fn test_validate_with_parses_principals() {
        let config = AppConfig::default();
        assert!(config.validate_with(prefix_version).is_ok());

        let mut bad_sender = config.clone();
        bad_sender.pools.sender = "hello".to_string();
        assert!(matches!(
            bad_sender.validate_with(prefix_version),
            Err(ValidationError::InvalidIdentifier { .. })
        ));

        let mut bad_token = config.clone();
        bad_token.discovery.known_tokens = vec![TokenRef::new("not-a-principal.token")];
        assert!(bad_token.validate_with(prefix_version).is_err());
    }

    #[test]
    fn test_validate_with_checks_network() {
        let mut config = AppConfig::default();
        config.network = Network::Testnet;
        assert!(matches!(
            config.validate_with(prefix_version),
            Err(ValidationError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_token() {
        let mut config = AppConfig::default();
        config.discovery.known_tokens = vec![TokenRef::new("not-a-contract")];
        assert!(config.validate().is_err());
    }
}
