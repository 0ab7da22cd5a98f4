//! Keypair generation and strkey handling.

use crate::{logging, LedgerError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use stellar_strkey::ed25519::{PrivateKey, PublicKey};

/// A freshly generated account: `G...` public key and `S...` secret seed.
///
/// The core never keeps wallets around; the caller owns the secret.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    pub public_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Generate a new wallet from the operating system CSPRNG.
pub fn create_wallet() -> Wallet {
    let keypair = Keypair::random();
    logging::log_wallet_created(&keypair.public_key());
    Wallet {
        public_key: keypair.public_key(),
        secret_key: keypair.secret(),
    }
}

/// An ed25519 signing keypair in the ledger's native key format.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load a keypair from an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self> {
        let seed = PrivateKey::from_string(secret.trim()).map_err(|e| {
            LedgerError::InvalidKeyFormat(format!("secret seed is not a valid strkey: {e:?}"))
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed.0),
        })
    }

    /// `G...` address of this keypair.
    pub fn public_key(&self) -> String {
        PublicKey(self.public_key_bytes()).to_string()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// `S...` secret seed. Never log this.
    pub fn secret(&self) -> String {
        PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        self.signing_key.sign(payload).to_bytes()
    }

    /// Last four bytes of the public key, used by validators to pick the
    /// signer matching a decorated signature.
    pub fn signature_hint(&self) -> [u8; 4] {
        let bytes = self.public_key_bytes();
        [bytes[28], bytes[29], bytes[30], bytes[31]]
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Decode a `G...` account id into its raw ed25519 key.
pub fn parse_account_id(account_id: &str) -> Result<[u8; 32]> {
    PublicKey::from_string(account_id.trim())
        .map(|key| key.0)
        .map_err(|e| {
            LedgerError::InvalidKeyFormat(format!(
                "'{account_id}' is not a valid account id: {e:?}"
            ))
        })
}

/// Verify an ed25519 signature made by the holder of `public_key`.
pub fn verify(public_key: &str, payload: &[u8], signature: &[u8; 64]) -> Result<()> {
    let raw = parse_account_id(public_key)?;
    let verifying_key = VerifyingKey::from_bytes(&raw)
        .map_err(|e| LedgerError::InvalidKeyFormat(format!("not an ed25519 point: {e}")))?;
    verifying_key
        .verify(payload, &Signature::from_bytes(signature))
        .map_err(|e| LedgerError::InvalidArgument(format!("signature mismatch: {e}")))
}
