//! The facade callers use.
//!
//! [`LedgerOrchestrator`] owns a replaceable configuration snapshot and a
//! [`Connector`]. Each operation takes the snapshot current at its start,
//! opens fresh endpoint handles, and drops them when it returns, so
//! concurrent calls share no mutable state and a replaced configuration only
//! affects calls that start afterwards.

use crate::client::{Connector, HttpConnector, TransactionRecord};
use crate::config::LedgerConfig;
use crate::funding::FundingClient;
use crate::invoke::{ContractCallResult, ContractInvoker};
use crate::keys::{self, Wallet};
use crate::payment::{PaymentRequest, PaymentResult, PaymentSubmitter};
use crate::query::LedgerQueryClient;
use crate::xdr::ContractArg;
use crate::{logging, Result};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

pub struct LedgerOrchestrator<C: Connector = HttpConnector> {
    connector: C,
    config: RwLock<Arc<LedgerConfig>>,
}

impl LedgerOrchestrator<HttpConnector> {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_connector(HttpConnector, config)
    }
}

impl<C: Connector> LedgerOrchestrator<C> {
    pub fn with_connector(connector: C, config: LedgerConfig) -> Self {
        Self {
            connector,
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the configuration in effect right now.
    pub fn config(&self) -> Arc<LedgerConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap the configuration. In-flight calls keep the snapshot they started with.
    pub fn replace_config(&self, config: LedgerConfig) {
        logging::log_config_replaced(config.horizon_url.as_str(), config.soroban_rpc_url.as_str());
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    pub fn create_wallet(&self) -> Wallet {
        keys::create_wallet()
    }

    pub async fn fund_testnet_wallet(&self, public_key: &str) -> Result<Value> {
        let config = self.config();
        let faucet = config
            .faucet_url
            .as_ref()
            .map(|url| self.connector.faucet(&config, url))
            .transpose()?;
        FundingClient::new(faucet).fund_testnet_wallet(public_key).await
    }

    pub async fn get_balance(&self, public_key: &str) -> Result<String> {
        let config = self.config();
        LedgerQueryClient::new(self.connector.horizon(&config)?)
            .get_balance(public_key)
            .await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionRecord> {
        let config = self.config();
        LedgerQueryClient::new(self.connector.horizon(&config)?)
            .get_transaction(hash)
            .await
    }

    pub async fn send_transaction(&self, request: &PaymentRequest) -> Result<PaymentResult> {
        let config = self.config();
        PaymentSubmitter::new(self.connector.horizon(&config)?, &config)
            .send_transaction(request)
            .await
    }

    pub async fn invoke_contract(&self, method: &str, args: Vec<ContractArg>) -> Result<ContractCallResult> {
        let config = self.config();
        ContractInvoker::new(self.connector.soroban_rpc(&config)?, &config)?
            .invoke_contract(method, args)
            .await
    }
}
