use crate::keys::Keypair;
use crate::network::{
    Network, BASE_FEE, DEFAULT_TX_TIMEOUT_SECS, TESTNET_FRIENDBOT_URL,
    TESTNET_HORIZON_URL, TESTNET_PASSPHRASE, TESTNET_SOROBAN_RPC_URL,
};
use crate::{LedgerError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".soroban-orch.toml";

/// Environment variables consulted by [`LedgerConfig::apply_env_overrides`].
pub const ENV_HORIZON: &str = "STELLAR_HORIZON";
pub const ENV_SOROBAN_RPC: &str = "SOROBAN_RPC";
pub const ENV_BACKEND_SECRET: &str = "BACKEND_SECRET_KEY";
pub const ENV_CONTRACT_ID: &str = "SOROBAN_CONTRACT_ID";
pub const ENV_PASSPHRASE: &str = "STELLAR_NETWORK_PASSPHRASE";
pub const ENV_FAUCET: &str = "STELLAR_FAUCET";

/// Longest accepted transaction validity window, in seconds.
pub const MAX_TX_TIMEOUT_SECS: u64 = 86_400;

/// Everything the orchestrator needs to talk to a network.
///
/// The library never reads files or the environment on its own; callers
/// build this value (the binary does it via [`LedgerConfig::load`]) and hand
/// it over.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Horizon index endpoint
    pub horizon_url: Url,
    /// Soroban JSON-RPC endpoint
    pub soroban_rpc_url: Url,
    /// Passphrase of the network; the signing domain of every transaction
    pub network_passphrase: String,
    /// Secret seed of the account that pays for contract invocations
    pub backend_secret_key: Option<String>,
    /// `C...` address of the target contract
    pub contract_id: Option<String>,
    /// Friendbot endpoint; `None` disables funding
    pub faucet_url: Option<Url>,
    /// Base fee per operation, in stroops
    pub base_fee: u32,
    /// Validity window of built transactions
    pub tx_timeout_secs: u64,
    /// Timeout for each HTTP request
    pub http_timeout_secs: u64,
    pub poll: PollPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            horizon_url: parse_url(TESTNET_HORIZON_URL),
            soroban_rpc_url: parse_url(TESTNET_SOROBAN_RPC_URL),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            backend_secret_key: None,
            contract_id: None,
            faucet_url: Some(parse_url(TESTNET_FRIENDBOT_URL)),
            base_fee: BASE_FEE,
            tx_timeout_secs: DEFAULT_TX_TIMEOUT_SECS,
            http_timeout_secs: 30,
            poll: PollPolicy::default(),
        }
    }
}

// Only used on compile-time constants.
fn parse_url(raw: &str) -> Url {
    match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => unreachable!("built-in url {raw} is invalid: {e}"),
    }
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("horizon_url", &self.horizon_url.as_str())
            .field("soroban_rpc_url", &self.soroban_rpc_url.as_str())
            .field("network_passphrase", &self.network_passphrase)
            .field(
                "backend_secret_key",
                &self.backend_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("contract_id", &self.contract_id)
            .field("faucet_url", &self.faucet_url.as_ref().map(Url::as_str))
            .field("base_fee", &self.base_fee)
            .field("tx_timeout_secs", &self.tx_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll", &self.poll)
            .finish()
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file, defaulting to
    /// [`DEFAULT_CONFIG_FILE`] in the working directory. A missing file yields
    /// the testnet defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        if !config_path.exists() {
            if path.is_some() {
                return Err(LedgerError::Config(format!(
                    "config file {:?} does not exist",
                    config_path
                )));
            }
            return Ok(LedgerConfig::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            LedgerError::Config(format!(
                "Failed to read config file {:?}: {}",
                config_path, e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            LedgerError::Config(format!(
                "Failed to parse TOML config from {:?}: {}",
                config_path, e
            ))
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_HORIZON) {
            self.horizon_url = parse_env_url(ENV_HORIZON, &value)?;
        }
        if let Some(value) = get(ENV_SOROBAN_RPC) {
            self.soroban_rpc_url = parse_env_url(ENV_SOROBAN_RPC, &value)?;
        }
        if let Some(value) = get(ENV_PASSPHRASE) {
            self.network_passphrase = value;
        }
        if let Some(value) = get(ENV_FAUCET) {
            self.faucet_url = if value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_env_url(ENV_FAUCET, &value)?)
            };
        }
        if let Some(value) = get(ENV_BACKEND_SECRET) {
            self.backend_secret_key = Some(value);
        }
        if let Some(value) = get(ENV_CONTRACT_ID) {
            self.contract_id = Some(value);
        }
        Ok(())
    }

    /// Check the credentials that are present for well-formedness.
    pub fn validate(&self) -> Result<()> {
        if let Some(secret) = &self.backend_secret_key {
            Keypair::from_secret(secret)?;
        }
        if let Some(contract) = &self.contract_id {
            crate::xdr::parse_contract_id(contract)?;
        }
        if !(1..=MAX_TX_TIMEOUT_SECS).contains(&self.tx_timeout_secs) {
            return Err(LedgerError::Config(format!(
                "tx_timeout_secs must be between 1 and {MAX_TX_TIMEOUT_SECS}, got {}",
                self.tx_timeout_secs
            )));
        }
        if self.poll.max_attempts == 0 {
            return Err(LedgerError::Config(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.network().is_test_network() && self.faucet_url.is_some() {
            warn!("A faucet is configured for the public network; funding requests will fail");
        }
        Ok(())
    }

    pub fn network(&self) -> Network {
        Network::new(self.network_passphrase.clone())
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The backend signing keypair, loaded fresh on every call.
    pub fn backend_keypair(&self) -> Result<Keypair> {
        let secret = self.backend_secret_key.as_deref().ok_or_else(|| {
            LedgerError::Config(format!(
                "no backend signing secret configured (set {ENV_BACKEND_SECRET})"
            ))
        })?;
        Keypair::from_secret(secret)
    }

    pub fn contract(&self) -> Result<&str> {
        self.contract_id.as_deref().ok_or_else(|| {
            LedgerError::Config(format!(
                "no contract address configured (set {ENV_CONTRACT_ID})"
            ))
        })
    }
}

fn parse_env_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim())
        .map_err(|e| LedgerError::Config(format!("{key}='{value}' is not a valid URL: {e}")))
}

/// Retry-with-ceiling policy for confirmation polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Pause before each status check, in milliseconds
    pub interval_ms: u64,
    /// Number of status checks before giving up
    pub max_attempts: u32,
    /// Upper bound of random extra delay added to each pause, in milliseconds
    pub jitter_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_attempts: 20,
            jitter_ms: 0,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
            jitter_ms: 0,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter_ms = jitter.as_millis() as u64;
        self
    }

    /// Pause to apply before the next status check.
    pub fn next_delay(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.interval_ms.saturating_add(jitter))
    }
}
