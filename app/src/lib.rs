//! pool-scout application library

pub mod commands;

use std::path::Path;
use std::time::Duration;

use amm::StateReader;
use amm_core::AppConfig;
use clarity_value::address_version;
use stacks_client::LedgerClient;
use tokio::time::Instant;

/// Install the global subscriber. `RUST_LOG` adds to the defaults.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pool_scout=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

/// Shared state for one command invocation
pub struct AppState {
    pub config: AppConfig,
    pub reader: StateReader<LedgerClient>,
}

impl AppState {
    /// Load the config file (or defaults) and connect the ledger client
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };
        Ok(Self::new(config)?)
    }

    /// Validate every configured principal, then build the reader
    pub fn new(config: AppConfig) -> amm_core::Result<Self> {
        config.validate_with(|s| address_version(s).map_err(|e| e.to_string()))?;
        let client = LedgerClient::new(config.node.clone())?;
        let reader = StateReader::new(client, config.pools.clone())
            .with_probe_concurrency(config.discovery.probe_concurrency);
        tracing::debug!(
            node = %config.node.url,
            network = config.network.as_str(),
            contract = %config.pools.contract,
            "Initialized ledger client"
        );
        Ok(Self { config, reader })
    }

    pub fn client(&self) -> &LedgerClient {
        self.reader.ledger()
    }

    /// Deadline for a discovery run started now
    pub fn discovery_deadline(&self) -> Option<Instant> {
        self.config
            .discovery
            .deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs))
    }
}
