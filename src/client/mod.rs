//! Remote ledger endpoints.
//!
//! Each endpoint is a trait so the components can be driven by scripted
//! in-memory ledgers in tests. A [`Connector`] turns the current configuration
//! into fresh handles; nothing here is cached between calls.

pub mod faucet;
pub mod horizon;
pub mod soroban_rpc;

pub use faucet::FriendbotClient;
pub use horizon::{
    AccountRecord, BalanceLine, HorizonClient, SubmittedTransaction, TransactionRecord,
};
pub use soroban_rpc::{
    GetLedgerEntriesResponse, GetTransactionResponse, LedgerEntryResult, RestorePreamble,
    SendTransactionResponse, SimulateHostFunctionResult, SimulateTransactionResponse,
    SorobanRpcClient, TransactionStatus,
};

use crate::config::LedgerConfig;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Read and submit access to the Horizon index.
#[async_trait]
pub trait HorizonApi: Send + Sync {
    async fn account(&self, account_id: &str) -> Result<AccountRecord>;

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord>;

    /// Submit a signed envelope and wait for inclusion or rejection.
    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmittedTransaction>;
}

/// The Soroban execution RPC.
#[async_trait]
pub trait SorobanRpcApi: Send + Sync {
    async fn get_ledger_entries(&self, keys: &[String]) -> Result<GetLedgerEntriesResponse>;

    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulateTransactionResponse>;

    /// Asynchronous submission; returns before the transaction is ledgered.
    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SendTransactionResponse>;

    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse>;
}

/// A test-network faucet.
#[async_trait]
pub trait FaucetApi: Send + Sync {
    async fn fund(&self, account_id: &str) -> Result<Value>;
}

/// Builds endpoint handles from a configuration snapshot.
pub trait Connector: Send + Sync {
    type Horizon: HorizonApi;
    type Rpc: SorobanRpcApi;
    type Faucet: FaucetApi;

    fn horizon(&self, config: &LedgerConfig) -> Result<Self::Horizon>;

    fn soroban_rpc(&self, config: &LedgerConfig) -> Result<Self::Rpc>;

    fn faucet(&self, config: &LedgerConfig, url: &Url) -> Result<Self::Faucet>;
}

/// HTTP connector: one lightweight reqwest client per handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Horizon = HorizonClient;
    type Rpc = SorobanRpcClient;
    type Faucet = FriendbotClient;

    fn horizon(&self, config: &LedgerConfig) -> Result<HorizonClient> {
        HorizonClient::new(config.horizon_url.clone(), config.http_timeout())
    }

    fn soroban_rpc(&self, config: &LedgerConfig) -> Result<SorobanRpcClient> {
        SorobanRpcClient::new(config.soroban_rpc_url.clone(), config.http_timeout())
    }

    fn faucet(&self, config: &LedgerConfig, url: &Url) -> Result<FriendbotClient> {
        FriendbotClient::new(url.clone(), config.http_timeout())
    }
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("soroban-orchestrator/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
