//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use tracing::info;

use crate::deployments::Deployments;
use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Soroban RPC endpoint (e.g. https://soroban-testnet.stellar.org)
    pub rpc_url: String,
    /// The voting contract address (Strkey format)
    pub contract_id: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from if no cursor is saved
    pub start_ledger: u32,
    /// Buffered vote notices per subscriber before it starts lagging
    pub feed_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `CONTRACT_ID` wins over the `voting` entry of `DEPLOYMENTS_FILE`; one
    /// of the two is required.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let contract_id = match (lookup("CONTRACT_ID"), lookup("DEPLOYMENTS_FILE")) {
            (Some(id), _) => id,
            (None, Some(path)) => {
                let deployments = Deployments::load(&PathBuf::from(&path))?;
                info!(
                    "Using voting contract from {path} (deployer: {}, {})",
                    deployments.deployer.as_deref().unwrap_or("unknown"),
                    deployments.describe_params()
                );
                deployments.voting
            }
            (None, None) => {
                return Err(IndexerError::Config(
                    "CONTRACT_ID or DEPLOYMENTS_FILE environment variable is required"
                        .to_string(),
                ))
            }
        };

        Ok(Config {
            rpc_url: var("RPC_URL", "https://soroban-testnet.stellar.org"),
            contract_id,
            database_url: var("DATABASE_URL", "sqlite:./voting_events.db"),
            api_port: var("API_PORT", "3001")
                .parse()
                .map_err(|_| IndexerError::Config("Invalid API_PORT".to_string()))?,
            poll_interval_secs: var("POLL_INTERVAL_SECS", "5")
                .parse()
                .map_err(|_| IndexerError::Config("Invalid POLL_INTERVAL_SECS".to_string()))?,
            events_per_page: var("EVENTS_PER_PAGE", "100")
                .parse()
                .map_err(|_| IndexerError::Config("Invalid EVENTS_PER_PAGE".to_string()))?,
            start_ledger: var("START_LEDGER", "0")
                .parse()
                .map_err(|_| IndexerError::Config("Invalid START_LEDGER".to_string()))?,
            feed_capacity: var("FEED_CAPACITY", "256")
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or_else(|| IndexerError::Config("Invalid FEED_CAPACITY".to_string()))?,
        })
    }
}
