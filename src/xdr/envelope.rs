//! Transaction construction, hashing and signing.

use super::muxed_account;
use crate::keys::Keypair;
use crate::network::Network;
use crate::{LedgerError, Result};
use sha2::{Digest, Sha256};
use std::time::Duration;
use stellar_xdr::curr::{
    DecoratedSignature, Limits, Memo, Operation, OperationBody, Preconditions, ReadXdr,
    SequenceNumber, Signature, SignatureHint, TimeBounds, TimePoint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, VecM, WriteXdr,
};

/// Longest text memo the network accepts, in bytes.
pub const MAX_MEMO_TEXT_LEN: usize = 28;

/// Inputs shared by every single-operation transaction we build.
#[derive(Debug, Clone)]
pub struct TransactionParams {
    /// Raw ed25519 key of the source account
    pub source: [u8; 32],
    /// Current sequence number of the source account
    pub current_sequence: i64,
    pub fee: u32,
    /// Validity window, measured from now
    pub timeout: Duration,
    pub memo: Memo,
}

/// Build a transaction carrying exactly one operation.
///
/// The transaction consumes `current_sequence + 1` and is only valid until
/// `now + timeout`; the network drops it after that.
pub fn build_transaction(params: &TransactionParams, body: OperationBody) -> Result<Transaction> {
    let seq = params.current_sequence.checked_add(1).ok_or_else(|| {
        LedgerError::InvalidArgument("account sequence number is exhausted".to_string())
    })?;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let max_time = now.checked_add(params.timeout.as_secs()).ok_or_else(|| {
        LedgerError::InvalidArgument(format!(
            "transaction timeout of {}s is out of range",
            params.timeout.as_secs()
        ))
    })?;
    let operations: VecM<Operation, 100> = vec![Operation {
        source_account: None,
        body,
    }]
    .try_into()?;

    Ok(Transaction {
        source_account: muxed_account(params.source),
        fee: params.fee,
        seq_num: SequenceNumber(seq),
        cond: Preconditions::Time(TimeBounds {
            min_time: TimePoint(0),
            max_time: TimePoint(max_time),
        }),
        memo: params.memo.clone(),
        operations,
        ext: TransactionExt::V0,
    })
}

/// Text memo, rejecting anything longer than the network allows.
pub fn text_memo(text: Option<&str>) -> Result<Memo> {
    match text {
        None => Ok(Memo::None),
        Some(text) if text.len() > MAX_MEMO_TEXT_LEN => Err(LedgerError::InvalidArgument(format!(
            "memo is {} bytes, the limit is {}",
            text.len(),
            MAX_MEMO_TEXT_LEN
        ))),
        Some(text) => Ok(Memo::Text(text.as_bytes().to_vec().try_into()?)),
    }
}

/// The hash validators sign: SHA-256 over the network id and the transaction.
pub fn transaction_hash(tx: &Transaction, network: &Network) -> Result<[u8; 32]> {
    let payload = TransactionSignaturePayload {
        network_id: network.network_id(),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(bytes).into())
}

/// A signed envelope together with its network hash.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub envelope: TransactionEnvelope,
    pub hash: [u8; 32],
}

impl SignedTransaction {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(self.envelope.to_xdr_base64(Limits::none())?)
    }
}

/// Sign `tx` for `network` with `signer`.
pub fn sign_transaction(tx: Transaction, network: &Network, signer: &Keypair) -> Result<SignedTransaction> {
    let hash = transaction_hash(&tx, network)?;
    let signature = DecoratedSignature {
        hint: SignatureHint(signer.signature_hint()),
        signature: Signature(signer.sign(&hash).to_vec().try_into()?),
    };
    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: vec![signature].try_into()?,
    });
    Ok(SignedTransaction { envelope, hash })
}

/// Wrap an unsigned transaction for endpoints that only inspect it
/// (simulation).
pub fn unsigned_envelope(tx: Transaction) -> TransactionEnvelope {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    })
}

pub fn envelope_to_base64(envelope: &TransactionEnvelope) -> Result<String> {
    Ok(envelope.to_xdr_base64(Limits::none())?)
}

pub fn envelope_from_base64(encoded: &str) -> Result<TransactionEnvelope> {
    Ok(TransactionEnvelope::from_xdr_base64(encoded, super::remote_limits())?)
}
