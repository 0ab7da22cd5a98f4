//! Read-only queries against the Horizon index.

use crate::client::{AccountRecord, HorizonApi, TransactionRecord};
use crate::keys::parse_account_id;
use crate::{logging, LedgerError, Result};

/// Balance reported for accounts that hold no native line.
pub const ZERO_BALANCE: &str = "0";

pub struct LedgerQueryClient<H> {
    horizon: H,
}

impl<H: HorizonApi> LedgerQueryClient<H> {
    pub fn new(horizon: H) -> Self {
        Self { horizon }
    }

    pub async fn load_account(&self, public_key: &str) -> Result<AccountRecord> {
        parse_account_id(public_key)?;
        self.horizon.account(public_key.trim()).await
    }

    /// Native balance of `public_key` as Horizon formats it (7 decimals).
    pub async fn get_balance(&self, public_key: &str) -> Result<String> {
        let account = self.load_account(public_key).await?;
        let balance = account
            .native_balance()
            .unwrap_or(ZERO_BALANCE)
            .to_string();
        logging::log_balance_lookup(&account.account_id, &balance);
        Ok(balance)
    }

    pub async fn sequence_number(&self, public_key: &str) -> Result<i64> {
        self.load_account(public_key).await?.sequence_number()
    }

    /// Look up a transaction by its hex hash.
    ///
    /// `TransactionNotFound` can be transient right after submission.
    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionRecord> {
        let hash = hash.trim();
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidArgument(format!(
                "'{hash}' is not a 64 character hex transaction hash"
            )));
        }
        self.horizon.transaction(&hash.to_ascii_lowercase()).await
    }
}
