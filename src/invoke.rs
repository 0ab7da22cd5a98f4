//! Contract invocation: build, simulate, sign, submit, confirm, decode.

use crate::client::{GetTransactionResponse, SimulateTransactionResponse, SorobanRpcApi, TransactionStatus};
use crate::config::{LedgerConfig, PollPolicy};
use crate::keys::Keypair;
use crate::network::Network;
use crate::xdr::args::symbol;
use crate::xdr::envelope::{
    build_transaction, envelope_to_base64, sign_transaction, unsigned_envelope, SignedTransaction,
    TransactionParams,
};
use crate::xdr::{
    account_id, decode_return_value, parse_contract_id, remote_limits, scval_to_native, ContractArg,
};
use crate::{logging, LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, LedgerEntryData, LedgerKey,
    LedgerKeyAccount, Limits, Memo, OperationBody, ReadXdr, ScAddress, ScVal,
    SorobanAuthorizationEntry, SorobanTransactionData, Transaction, TransactionExt, VecM, WriteXdr,
};

/// Value reported for transactions that return nothing.
pub const NO_RETURN_VALUE: &str = "OK";

/// Progress of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStage {
    Built,
    Simulated,
    Signed,
    Submitted,
    Success,
    Failed,
    TimedOut,
}

impl fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvocationStage::Built => "built",
            InvocationStage::Simulated => "simulated",
            InvocationStage::Signed => "signed",
            InvocationStage::Submitted => "submitted",
            InvocationStage::Success => "success",
            InvocationStage::Failed => "failed",
            InvocationStage::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCallResult {
    pub method: String,
    pub args: Vec<ContractArg>,
    /// Decoded return value
    pub result: Value,
}

/// Drives one contract through the full prepare/submit/confirm pipeline.
pub struct ContractInvoker<R> {
    rpc: R,
    network: Network,
    signer: Keypair,
    contract_id: String,
    contract: [u8; 32],
    base_fee: u32,
    tx_timeout: Duration,
    poll: PollPolicy,
}

impl<R: SorobanRpcApi> ContractInvoker<R> {
    /// Resolve the configured contract and backend signer.
    pub fn new(rpc: R, config: &LedgerConfig) -> Result<Self> {
        let contract_id = config.contract()?.trim().to_string();
        let contract = parse_contract_id(&contract_id)?;
        Ok(Self {
            rpc,
            network: config.network(),
            signer: config.backend_keypair()?,
            contract_id,
            contract,
            base_fee: config.base_fee,
            tx_timeout: config.tx_timeout(),
            poll: config.poll,
        })
    }

    pub async fn invoke_contract(&self, method: &str, args: Vec<ContractArg>) -> Result<ContractCallResult> {
        logging::log_invocation_start(&self.contract_id, method, args.len());

        let function_name = symbol(method)?;
        let call_args = args
            .iter()
            .map(ContractArg::to_scval)
            .collect::<Result<Vec<ScVal>>>()?;
        let sequence = self.account_sequence().await?;

        let params = TransactionParams {
            source: self.signer.public_key_bytes(),
            current_sequence: sequence,
            fee: self.base_fee,
            timeout: self.tx_timeout,
            memo: Memo::None,
        };
        let tx = build_transaction(
            &params,
            OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: ScAddress::Contract(Hash(self.contract)),
                    function_name,
                    args: call_args.try_into()?,
                }),
                auth: VecM::default(),
            }),
        )?;
        logging::log_invocation_stage(method, InvocationStage::Built);

        let tx = self.simulate(method, tx).await?;
        logging::log_invocation_stage(method, InvocationStage::Simulated);

        let signed = sign_transaction(tx, &self.network, &self.signer)?;
        logging::log_invocation_stage(method, InvocationStage::Signed);

        let hash = self.submit(&signed).await?;
        logging::log_invocation_stage(method, InvocationStage::Submitted);

        let (confirmed, attempts) = self.await_confirmation(method, &hash).await?;
        let result = decode_result(&hash, &confirmed)?;
        logging::log_invocation_complete(method, &hash, attempts);

        Ok(ContractCallResult {
            method: method.to_string(),
            args,
            result,
        })
    }

    /// Current sequence of the backend account, read from RPC ledger state.
    async fn account_sequence(&self) -> Result<i64> {
        let key = LedgerKey::Account(LedgerKeyAccount {
            account_id: account_id(self.signer.public_key_bytes()),
        });
        let response = self
            .rpc
            .get_ledger_entries(&[key.to_xdr_base64(Limits::none())?])
            .await?;
        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::AccountNotFound(self.signer.public_key()))?;

        match LedgerEntryData::from_xdr_base64(&entry.xdr, remote_limits())? {
            LedgerEntryData::Account(account) => Ok(account.seq_num.0),
            other => Err(LedgerError::Xdr(format!(
                "expected an account entry, got {}",
                other.name()
            ))),
        }
    }

    async fn simulate(&self, method: &str, tx: Transaction) -> Result<Transaction> {
        let failed = |reason: String| LedgerError::SimulationFailed {
            method: method.to_string(),
            reason,
        };

        let envelope = envelope_to_base64(&unsigned_envelope(tx.clone()))?;
        let mut simulation = self.rpc.simulate_transaction(&envelope).await?;
        if let Some(error) = simulation.error.take() {
            return Err(failed(error));
        }
        if simulation.restore_preamble.is_some() {
            return Err(failed(
                "contract state is archived and must be restored first".to_string(),
            ));
        }

        let prepared = Prepared::from_simulation(simulation).map_err(failed)?;
        logging::log_simulation(method, prepared.min_resource_fee, prepared.auth.len());
        prepared.assemble(tx)
    }

    async fn submit(&self, signed: &SignedTransaction) -> Result<String> {
        let response = self.rpc.send_transaction(&signed.to_base64()?).await?;
        let hash = if response.hash.is_empty() {
            signed.hash_hex()
        } else {
            response.hash
        };
        if !response.status.is_accepted() {
            return Err(LedgerError::SubmissionRejected {
                hash,
                status: response.status.to_string(),
                error_result_xdr: response.error_result_xdr,
            });
        }
        Ok(hash)
    }

    /// Sleep-then-check loop; only the status check is retried, never the
    /// submission.
    async fn await_confirmation(&self, method: &str, hash: &str) -> Result<(GetTransactionResponse, u32)> {
        for attempt in 1..=self.poll.max_attempts {
            tokio::time::sleep(self.poll.next_delay()).await;
            let response = self.rpc.get_transaction(hash).await?;
            logging::log_poll_attempt(hash, attempt, &response.status.to_string());

            match response.status {
                TransactionStatus::Success => {
                    logging::log_invocation_stage(method, InvocationStage::Success);
                    return Ok((response, attempt));
                }
                TransactionStatus::Failed => {
                    logging::log_invocation_stage(method, InvocationStage::Failed);
                    return Err(LedgerError::ContractExecutionFailed {
                        hash: hash.to_string(),
                        result_xdr: response.result_xdr,
                    });
                }
                _ => {}
            }
        }

        logging::log_invocation_stage(method, InvocationStage::TimedOut);
        Err(LedgerError::ConfirmationTimeout {
            hash: hash.to_string(),
            attempts: self.poll.max_attempts,
        })
    }
}

/// Resource data a successful simulation hands back.
struct Prepared {
    transaction_data: SorobanTransactionData,
    min_resource_fee: i64,
    auth: Vec<SorobanAuthorizationEntry>,
}

impl Prepared {
    fn from_simulation(simulation: SimulateTransactionResponse) -> std::result::Result<Self, String> {
        let encoded = simulation
            .transaction_data
            .ok_or_else(|| "simulation returned no transaction data".to_string())?;
        let transaction_data = SorobanTransactionData::from_xdr_base64(&encoded, remote_limits())
            .map_err(|e| format!("invalid transactionData: {e}"))?;

        let min_resource_fee = match simulation.min_resource_fee.as_deref() {
            None => 0,
            Some(fee) => fee
                .parse::<i64>()
                .ok()
                .filter(|fee| *fee >= 0)
                .ok_or_else(|| format!("invalid minResourceFee '{fee}'"))?,
        };

        let auth = simulation
            .results
            .first()
            .map(|result| result.auth.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|entry| {
                SorobanAuthorizationEntry::from_xdr_base64(entry, remote_limits())
                    .map_err(|e| format!("invalid auth entry: {e}"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            transaction_data,
            min_resource_fee,
            auth,
        })
    }

    /// Attach resources, raise the fee and install the simulated auth entries.
    fn assemble(self, mut tx: Transaction) -> Result<Transaction> {
        tx.fee = u32::try_from(i64::from(tx.fee) + self.min_resource_fee).map_err(|_| {
            LedgerError::InvalidArgument(format!(
                "resource fee {} does not fit in a transaction fee",
                self.min_resource_fee
            ))
        })?;
        tx.ext = TransactionExt::V1(self.transaction_data);

        let mut operations = tx.operations.to_vec();
        for op in operations.iter_mut() {
            if let OperationBody::InvokeHostFunction(invoke) = &mut op.body {
                if invoke.auth.is_empty() && !self.auth.is_empty() {
                    invoke.auth = self.auth.clone().try_into()?;
                }
            }
        }
        tx.operations = operations.try_into()?;
        Ok(tx)
    }
}

fn decode_result(hash: &str, confirmed: &GetTransactionResponse) -> Result<Value> {
    let decode_failed = |reason: String| LedgerError::ResultDecodeFailed {
        hash: hash.to_string(),
        reason,
    };
    let value = decode_return_value(
        confirmed.return_value.as_deref(),
        confirmed.result_meta_xdr.as_deref(),
    )
    .map_err(decode_failed)?;

    match value {
        None => Ok(Value::String(NO_RETURN_VALUE.to_string())),
        Some(val) => scval_to_native(&val).map_err(decode_failed),
    }
}
