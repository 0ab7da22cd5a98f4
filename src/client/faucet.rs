use super::{http_client, FaucetApi};
use crate::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Friendbot-style faucet: `GET <url>?addr=<account>`.
#[derive(Debug, Clone)]
pub struct FriendbotClient {
    inner: Client,
    url: Url,
}

impl FriendbotClient {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            inner: http_client(timeout)?,
            url,
        })
    }
}

#[async_trait]
impl FaucetApi for FriendbotClient {
    async fn fund(&self, account_id: &str) -> Result<Value> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("addr", account_id);
        debug!(url = %url, "Faucet request");

        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::FundingUnavailable(format!("faucet unreachable: {e}")))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(LedgerError::FundingUnavailable(format!(
                "faucet returned {status}: {}",
                detail.trim()
            )));
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
