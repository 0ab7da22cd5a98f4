//! Network identity: passphrases, default endpoints and the signing domain.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::Hash;

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const TESTNET_SOROBAN_RPC_URL: &str = "https://soroban-testnet.stellar.org";
pub const TESTNET_FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Minimum per-operation fee in stroops.
pub const BASE_FEE: u32 = 100;

/// Validity window applied to every transaction we build, in seconds.
pub const DEFAULT_TX_TIMEOUT_SECS: u64 = 180;

/// A ledger network, identified by its passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    passphrase: String,
}

impl Network {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    pub fn testnet() -> Self {
        Self::new(TESTNET_PASSPHRASE)
    }

    pub fn public() -> Self {
        Self::new(PUBLIC_PASSPHRASE)
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// SHA-256 of the passphrase. Signatures are computed over this id so a
    /// transaction signed for one network is invalid on every other.
    pub fn network_id(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.passphrase.as_bytes());
        Hash(hasher.finalize().into())
    }

    /// Whether friendbot funding makes sense on this network.
    pub fn is_test_network(&self) -> bool {
        self.passphrase != PUBLIC_PASSPHRASE
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::testnet()
    }
}
