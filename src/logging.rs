//! Structured logging helpers for the orchestrator.
//!
//! Every ledger-facing step logs through these helpers so field names stay
//! consistent across components. Secret seeds are never accepted here.

use crate::invoke::InvocationStage;

/// Log wallet creation.
pub fn log_wallet_created(public_key: &str) {
    tracing::info!(public_key, "Wallet created");
}

/// Log a faucet funding request.
pub fn log_funding_request(public_key: &str) {
    tracing::info!(public_key, "Requesting testnet funding");
}

/// Log a balance lookup.
pub fn log_balance_lookup(public_key: &str, balance: &str) {
    tracing::debug!(public_key, balance, "Native balance loaded");
}

/// Log payment construction.
pub fn log_payment_building(source: &str, destination: &str, amount: &str, sequence: i64) {
    tracing::info!(source, destination, amount, sequence, "Building payment");
}

/// Log a payment accepted into a ledger.
pub fn log_payment_submitted(hash: &str, ledger: u32) {
    tracing::info!(hash, ledger, "Payment included in ledger");
}

/// Log a payment rejected by the network.
pub fn log_payment_rejected(transaction_code: &str, operation_codes: &[String]) {
    tracing::warn!(
        transaction_code,
        operations = ?operation_codes,
        "Payment rejected"
    );
}

/// Log the start of a contract invocation.
pub fn log_invocation_start(contract: &str, method: &str, arg_count: usize) {
    tracing::info!(contract, method, args = arg_count, "Invoking contract");
}

/// Log an invocation state transition.
pub fn log_invocation_stage(method: &str, stage: InvocationStage) {
    tracing::debug!(method, stage = %stage, "Invocation stage");
}

/// Log simulation results.
pub fn log_simulation(method: &str, min_resource_fee: i64, auth_entries: usize) {
    tracing::debug!(method, min_resource_fee, auth_entries, "Simulation succeeded");
}

/// Log one confirmation poll.
pub fn log_poll_attempt(hash: &str, attempt: u32, status: &str) {
    tracing::debug!(hash, attempt, status, "Polled transaction status");
}

/// Log a finished invocation.
pub fn log_invocation_complete(method: &str, hash: &str, attempts: u32) {
    tracing::info!(method, hash, attempts, "Invocation confirmed");
}

/// Log configuration replacement.
pub fn log_config_replaced(horizon: &str, soroban_rpc: &str) {
    tracing::info!(horizon, soroban_rpc, "Configuration replaced");
}
