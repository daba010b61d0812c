//! Flow configuration.
//!
//! Carries the relying-party parameters shared by both flows: the URI bound
//! into every challenge, the human-readable statement, the configured chain
//! list (the first entry is authoritative for signing), and the teardown
//! delay after a completed authentication. Values come from the constructor
//! or from env vars via [`LinkConfig::from_env`].

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Statement embedded in every challenge unless overridden.
pub const DEFAULT_STATEMENT: &str = "Please sign with your account";

/// Chain used when no chain list is configured.
pub const DEFAULT_CHAIN_ID: u64 = 1;

const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(2);

const ENV_URI: &str = "WALLETLINK_URI";
const ENV_CHAINS: &str = "WALLETLINK_CHAINS";
const ENV_STATEMENT: &str = "WALLETLINK_STATEMENT";
const ENV_CLOSE_DELAY_MS: &str = "WALLETLINK_CLOSE_DELAY_MS";

/// Relying-party configuration for the link and transaction flows.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    uri: String,
    pub statement: String,
    chains: Vec<u64>,
    pub close_delay: Duration,
}

impl LinkConfig {
    /// Create a configuration for the given relying-party URI.
    ///
    /// The URI is validated but stored verbatim, so the challenge text
    /// carries exactly what the caller supplied.
    pub fn new(uri: &str) -> Result<Self, ConfigError> {
        let trimmed = uri.trim();
        Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
            key: ENV_URI.to_string(),
            message: format!("'{trimmed}' is not a valid URL: {e}"),
        })?;
        Ok(Self {
            uri: trimmed.to_string(),
            statement: DEFAULT_STATEMENT.to_string(),
            chains: vec![DEFAULT_CHAIN_ID],
            close_delay: DEFAULT_CLOSE_DELAY,
        })
    }

    /// Load configuration from the environment.
    ///
    /// `WALLETLINK_URI` is required; `WALLETLINK_CHAINS` (comma-separated
    /// chain ids), `WALLETLINK_STATEMENT`, and `WALLETLINK_CLOSE_DELAY_MS`
    /// override the defaults. A `.env` file is honored if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let uri = std::env::var(ENV_URI).map_err(|_| ConfigError::MissingRequired {
            key: ENV_URI.to_string(),
            hint: "Set it to the relying-party origin, e.g. https://example.com".to_string(),
        })?;
        let mut config = Self::new(&uri)?;

        if let Ok(raw) = std::env::var(ENV_CHAINS) {
            config = config.with_chains(parse_chain_list(&raw)?)?;
        }
        if let Ok(statement) = std::env::var(ENV_STATEMENT) {
            config.statement = statement;
        }
        if let Ok(raw) = std::env::var(ENV_CLOSE_DELAY_MS) {
            let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CLOSE_DELAY_MS.to_string(),
                message: format!("expected milliseconds as an integer, got '{raw}'"),
            })?;
            config.close_delay = Duration::from_millis(millis);
        }
        Ok(config)
    }

    /// Replace the statement line.
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    /// Replace the chain list. The list must not be empty.
    pub fn with_chains(mut self, chains: Vec<u64>) -> Result<Self, ConfigError> {
        if chains.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_CHAINS.to_string(),
                message: "at least one chain id is required".to_string(),
            });
        }
        self.chains = chains;
        Ok(self)
    }

    /// Replace the post-completion teardown delay.
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = delay;
        self
    }

    /// Relying-party URI, exactly as configured.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Configured chain ids.
    pub fn chains(&self) -> &[u64] {
        &self.chains
    }

    /// The chain challenges are bound to. The first configured chain is
    /// authoritative; there is no multi-chain negotiation.
    pub fn primary_chain(&self) -> u64 {
        self.chains.first().copied().unwrap_or(DEFAULT_CHAIN_ID)
    }
}

fn parse_chain_list(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            chunk.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CHAINS.to_string(),
                message: format!("'{chunk}' is not a valid chain id"),
            })
        })
        .collect()
}
