//! Native-asset payments submitted through Horizon.

use crate::client::HorizonApi;
use crate::config::LedgerConfig;
use crate::keys::{parse_account_id, Keypair};
use crate::network::Network;
use crate::xdr::envelope::{build_transaction, sign_transaction, text_memo, TransactionParams};
use crate::xdr::muxed_account;
use crate::{logging, LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use stellar_xdr::curr::{Asset, OperationBody, PaymentOp};

/// Stroops in one lumen.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

const MAX_DECIMALS: usize = 7;

pub const PAYMENT_SENT: &str = "Payment sent";

#[derive(Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub source_secret: String,
    pub destination: String,
    /// Decimal lumens, e.g. `"12.5"`
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

impl PaymentRequest {
    pub fn new(
        source_secret: impl Into<String>,
        destination: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            source_secret: source_secret.into(),
            destination: destination.into(),
            amount: amount.into(),
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("source_secret", &"<redacted>")
            .field("destination", &self.destination)
            .field("amount", &self.amount)
            .field("memo", &self.memo)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub hash: String,
    pub successful: bool,
    pub ledger: u32,
    pub message: String,
}

/// Parse a positive decimal amount with at most 7 fractional digits into
/// stroops.
pub fn parse_amount(amount: &str) -> Result<i64> {
    let trimmed = amount.trim();
    let invalid =
        |reason: &str| LedgerError::InvalidArgument(format!("invalid amount '{amount}': {reason}"));

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("expected a decimal number"));
    }
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(fraction) {
        return Err(invalid("expected a positive decimal number"));
    }
    if fraction.len() > MAX_DECIMALS {
        return Err(invalid("at most 7 decimal places are allowed"));
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("too large"))?
    };
    let fraction: i64 = format!("{:0<width$}", fraction, width = MAX_DECIMALS)
        .parse()
        .map_err(|_| invalid("malformed fraction"))?;
    let stroops = whole
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(|| invalid("too large"))?;
    if stroops == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(stroops)
}

/// Builds, signs and submits single-operation native payments.
pub struct PaymentSubmitter<H> {
    horizon: H,
    network: Network,
    base_fee: u32,
    tx_timeout: Duration,
}

impl<H: HorizonApi> PaymentSubmitter<H> {
    pub fn new(horizon: H, config: &LedgerConfig) -> Self {
        Self {
            horizon,
            network: config.network(),
            base_fee: config.base_fee,
            tx_timeout: config.tx_timeout(),
        }
    }

    pub async fn send_transaction(&self, request: &PaymentRequest) -> Result<PaymentResult> {
        let source = Keypair::from_secret(&request.source_secret)?;
        let destination = parse_account_id(&request.destination).map_err(|e| {
            LedgerError::InvalidArgument(format!("payment destination: {e}"))
        })?;
        let amount = parse_amount(&request.amount)?;
        let memo = text_memo(request.memo.as_deref())?;

        let source_key = source.public_key();
        let sequence = self.horizon.account(&source_key).await?.sequence_number()?;
        logging::log_payment_building(&source_key, request.destination.trim(), &request.amount, sequence);

        let params = TransactionParams {
            source: source.public_key_bytes(),
            current_sequence: sequence,
            fee: self.base_fee,
            timeout: self.tx_timeout,
            memo,
        };
        let tx = build_transaction(
            &params,
            OperationBody::Payment(PaymentOp {
                destination: muxed_account(destination),
                asset: Asset::Native,
                amount,
            }),
        )?;
        let signed = sign_transaction(tx, &self.network, &source)?;

        match self.horizon.submit_transaction(&signed.to_base64()?).await {
            Ok(submitted) => {
                logging::log_payment_submitted(&submitted.hash, submitted.ledger);
                Ok(PaymentResult {
                    hash: submitted.hash,
                    successful: submitted.successful,
                    ledger: submitted.ledger,
                    message: PAYMENT_SENT.to_string(),
                })
            }
            Err(err) => {
                if let LedgerError::PaymentRejected {
                    transaction_code,
                    operation_codes,
                    ..
                } = &err
                {
                    logging::log_payment_rejected(transaction_code, operation_codes);
                }
                Err(err)
            }
        }
    }
}
