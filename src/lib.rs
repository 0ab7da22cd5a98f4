pub mod cli;
pub mod client;
pub mod config;
pub mod funding;
pub mod invoke;
pub mod keys;
pub mod logging;
pub mod network;
pub mod orchestrator;
pub mod output;
pub mod payment;
pub mod query;
pub mod xdr;
use miette::Diagnostic;

pub use config::{LedgerConfig, PollPolicy};
pub use invoke::{ContractCallResult, ContractInvoker, InvocationStage};
pub use keys::{Keypair, Wallet};
pub use orchestrator::LedgerOrchestrator;
pub use payment::{PaymentRequest, PaymentResult, PaymentSubmitter};
pub use xdr::ContractArg;

/// Result type alias for the orchestrator
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for the orchestrator
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum LedgerError {
    #[error("Invalid key format: {0}")]
    #[diagnostic(
        code(orchestrator::invalid_key_format),
        help("Public keys start with 'G', secret seeds with 'S' and contract ids with 'C'. Check for truncation or copy/paste damage.")
    )]
    InvalidKeyFormat(String),

    #[error("Funding unavailable: {0}")]
    #[diagnostic(
        code(orchestrator::funding_unavailable),
        help("Friendbot only exists on test networks. Retry later or fund the account manually.")
    )]
    FundingUnavailable(String),

    #[error("Account not found: {0}")]
    #[diagnostic(
        code(orchestrator::account_not_found),
        help("The account does not exist on this network yet. Fund it first.")
    )]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    #[diagnostic(
        code(orchestrator::transaction_not_found),
        help("Recently submitted transactions may take a few seconds to propagate to the index.")
    )]
    TransactionNotFound(String),

    #[error("Payment rejected: {transaction_code} (operations: {operation_codes:?})")]
    #[diagnostic(
        code(orchestrator::payment_rejected),
        help("`op_underfunded` means the source balance is too low, `tx_bad_seq` means another transaction used the sequence number first.")
    )]
    PaymentRejected {
        transaction_code: String,
        operation_codes: Vec<String>,
        result_xdr: Option<String>,
    },

    #[error("Simulation of `{method}` failed: {reason}")]
    #[diagnostic(
        code(orchestrator::simulation_failed),
        help("The call would fail on-chain. Check the method name, argument order and argument types.")
    )]
    SimulationFailed { method: String, reason: String },

    #[error("Submission of transaction {hash} rejected with status {status}")]
    #[diagnostic(code(orchestrator::submission_rejected))]
    SubmissionRejected {
        hash: String,
        status: String,
        error_result_xdr: Option<String>,
    },

    #[error("Contract execution failed in transaction {hash}")]
    #[diagnostic(
        code(orchestrator::contract_execution_failed),
        help("Decode the result XDR to see the failing operation result.")
    )]
    ContractExecutionFailed {
        hash: String,
        result_xdr: Option<String>,
    },

    #[error("Transaction {hash} was not confirmed after {attempts} status checks")]
    #[diagnostic(
        code(orchestrator::confirmation_timeout),
        help("The transaction may still land. Look it up by hash before resubmitting.")
    )]
    ConfirmationTimeout { hash: String, attempts: u32 },

    #[error("Failed to decode the result of transaction {hash}: {reason}")]
    #[diagnostic(
        code(orchestrator::result_decode_failed),
        help("The transaction succeeded on-chain; only the return value could not be decoded.")
    )]
    ResultDecodeFailed { hash: String, reason: String },

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(orchestrator::invalid_argument))]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    #[diagnostic(
        code(orchestrator::transport),
        help("Check that the configured Horizon and Soroban RPC endpoints are reachable.")
    )]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    #[diagnostic(code(orchestrator::rpc))]
    Rpc { code: i64, message: String },

    #[error("XDR error: {0}")]
    #[diagnostic(code(orchestrator::xdr))]
    Xdr(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(orchestrator::config),
        help("Set the value in .soroban-orch.toml or through the matching environment variable.")
    )]
    Config(String),
}

impl LedgerError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidKeyFormat(_) => "InvalidKeyFormat",
            LedgerError::FundingUnavailable(_) => "FundingUnavailable",
            LedgerError::AccountNotFound(_) => "AccountNotFound",
            LedgerError::TransactionNotFound(_) => "TransactionNotFound",
            LedgerError::PaymentRejected { .. } => "PaymentRejected",
            LedgerError::SimulationFailed { .. } => "SimulationFailed",
            LedgerError::SubmissionRejected { .. } => "SubmissionRejected",
            LedgerError::ContractExecutionFailed { .. } => "ContractExecutionFailed",
            LedgerError::ConfirmationTimeout { .. } => "ConfirmationTimeout",
            LedgerError::ResultDecodeFailed { .. } => "ResultDecodeFailed",
            LedgerError::InvalidArgument(_) => "InvalidArgument",
            LedgerError::Transport(_) => "Transport",
            LedgerError::Rpc { .. } => "Rpc",
            LedgerError::Xdr(_) => "Xdr",
            LedgerError::Config(_) => "Config",
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Transport(err.to_string())
    }
}

impl From<stellar_xdr::curr::Error> for LedgerError {
    fn from(err: stellar_xdr::curr::Error) -> Self {
        LedgerError::Xdr(err.to_string())
    }
}
