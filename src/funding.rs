//! Test-network funding through a faucet.

use crate::client::FaucetApi;
use crate::keys::parse_account_id;
use crate::{logging, LedgerError, Result};
use serde_json::Value;

/// One-shot faucet caller. Without a faucet (public network) every request
/// fails before touching the network.
pub struct FundingClient<F> {
    faucet: Option<F>,
}

impl<F: FaucetApi> FundingClient<F> {
    pub fn new(faucet: Option<F>) -> Self {
        Self { faucet }
    }

    /// Ask the faucet to create and fund `public_key`. Not retried.
    pub async fn fund_testnet_wallet(&self, public_key: &str) -> Result<Value> {
        parse_account_id(public_key)?;
        let faucet = self.faucet.as_ref().ok_or_else(|| {
            LedgerError::FundingUnavailable("no faucet is configured for this network".to_string())
        })?;
        logging::log_funding_request(public_key);
        faucet.fund(public_key.trim()).await
    }
}
