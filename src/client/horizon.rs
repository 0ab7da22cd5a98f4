use super::{http_client, HorizonApi};
use crate::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Asset type Horizon uses for lumens.
pub const NATIVE_ASSET_TYPE: &str = "native";

/// One entry of an account's `balances` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
    pub balance: String,
}

impl BalanceLine {
    pub fn native(balance: impl Into<String>) -> Self {
        Self {
            asset_type: NATIVE_ASSET_TYPE.to_string(),
            asset_code: None,
            asset_issuer: None,
            balance: balance.into(),
        }
    }
}

/// Horizon account record (the fields the core reads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: String,
    /// Horizon reports sequence numbers as decimal strings
    pub sequence: String,
    #[serde(default)]
    pub balances: Vec<BalanceLine>,
}

impl AccountRecord {
    pub fn sequence_number(&self) -> Result<i64> {
        self.sequence.parse().map_err(|e| {
            LedgerError::Transport(format!(
                "account {} has a malformed sequence '{}': {}",
                self.account_id, self.sequence, e
            ))
        })
    }

    /// Balance of the native asset, if the account has a native line.
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|line| line.asset_type == NATIVE_ASSET_TYPE)
            .map(|line| line.balance.as_str())
    }
}

/// Horizon transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub ledger: u32,
    pub successful: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub source_account: String,
    #[serde(default)]
    pub fee_charged: Option<String>,
    #[serde(default)]
    pub operation_count: u32,
    #[serde(default)]
    pub memo_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default)]
    pub envelope_xdr: String,
    #[serde(default)]
    pub result_xdr: String,
}

/// Outcome of a successful `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub hash: String,
    pub ledger: u32,
    #[serde(default = "default_true")]
    pub successful: bool,
}

fn default_true() -> bool {
    true
}

/// `application/problem+json` error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub extras: Option<ProblemExtras>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemExtras {
    #[serde(default)]
    pub result_codes: Option<ResultCodes>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultCodes {
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub operations: Vec<String>,
}

impl Problem {
    /// Turn a rejected submission into `PaymentRejected`, keeping the codes
    /// Horizon reported.
    pub fn into_rejection(self) -> LedgerError {
        let extras = self.extras.unwrap_or_default();
        let codes = extras.result_codes.unwrap_or_default();
        let transaction_code = if codes.transaction.is_empty() {
            self.title
        } else {
            codes.transaction
        };
        LedgerError::PaymentRejected {
            transaction_code,
            operation_codes: codes.operations,
            result_xdr: extras.result_xdr,
        }
    }
}

/// Client for a Horizon server.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    inner: Client,
    base: Url,
}

impl HorizonClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            inner: http_client(timeout)?,
            base,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Config(format!("{} cannot be used as a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a resource, mapping 404 through `not_found`.
    async fn get_json<T, F>(&self, url: Url, not_found: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> LedgerError,
    {
        debug!(url = %url, "Horizon request");
        let response = self.inner.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(not_found()),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(unexpected_status(status, response).await),
        }
    }
}

#[async_trait]
impl HorizonApi for HorizonClient {
    async fn account(&self, account_id: &str) -> Result<AccountRecord> {
        let url = self.url(&["accounts", account_id])?;
        self.get_json(url, || LedgerError::AccountNotFound(account_id.to_string()))
            .await
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord> {
        let url = self.url(&["transactions", hash])?;
        self.get_json(url, || LedgerError::TransactionNotFound(hash.to_string()))
            .await
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmittedTransaction> {
        let url = self.url(&["transactions"])?;
        debug!(url = %url, "Submitting transaction to Horizon");
        let response = self
            .inner
            .post(url)
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        if status == StatusCode::BAD_REQUEST {
            let problem: Problem = response.json().await?;
            if problem.extras.is_some() {
                return Err(problem.into_rejection());
            }
            return Err(LedgerError::Transport(format!(
                "Horizon rejected the request: {} {}",
                problem.title, problem.detail
            )));
        }
        Err(unexpected_status(status, response).await)
    }
}

async fn unexpected_status(status: StatusCode, response: reqwest::Response) -> LedgerError {
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Problem>(&body)
        .map(|p| format!("{} {}", p.title, p.detail))
        .unwrap_or(body);
    LedgerError::Transport(format!("Horizon returned {status}: {}", detail.trim()))
}
