pub mod args;
pub mod envelope;
pub mod native;

pub use args::{ArgumentParseError, ArgumentParser, ContractArg};
pub use envelope::{SignedTransaction, TransactionParams};
pub use native::{decode_return_value, scval_to_native};

use crate::keys::parse_account_id;
use crate::{LedgerError, Result};
use stellar_xdr::curr::{AccountId, Hash, Limits, MuxedAccount, PublicKey, ScAddress, Uint256};

/// Nesting ceiling for XDR read from remote endpoints.
pub const MAX_XDR_DEPTH: u32 = 500;

/// Read limits for XDR that arrives over the network.
pub fn remote_limits() -> Limits {
    Limits::depth(MAX_XDR_DEPTH)
}

/// Decode a `C...` contract address into its 32-byte id.
pub fn parse_contract_id(contract_id: &str) -> Result<[u8; 32]> {
    stellar_strkey::Contract::from_string(contract_id.trim())
        .map(|contract| contract.0)
        .map_err(|e| {
            LedgerError::InvalidArgument(format!(
                "'{contract_id}' is not a valid contract address: {e:?}"
            ))
        })
}

pub fn account_id(raw: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(raw)))
}

pub fn muxed_account(raw: [u8; 32]) -> MuxedAccount {
    MuxedAccount::Ed25519(Uint256(raw))
}

/// Parse a `G...` or `C...` strkey into an `ScAddress`.
pub fn parse_sc_address(address: &str) -> Result<ScAddress> {
    let trimmed = address.trim();
    if trimmed.starts_with('C') {
        Ok(ScAddress::Contract(Hash(parse_contract_id(trimmed)?)))
    } else {
        Ok(ScAddress::Account(account_id(parse_account_id(trimmed)?)))
    }
}

/// Render an `ScAddress` back into its strkey form.
pub fn sc_address_to_string(address: &ScAddress) -> String {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(raw)))) => {
            stellar_strkey::ed25519::PublicKey(*raw).to_string()
        }
        ScAddress::Contract(Hash(raw)) => stellar_strkey::Contract(*raw).to_string(),
    }
}
