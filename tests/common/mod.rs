#![allow(dead_code)]

pub mod http_stub;

use async_trait::async_trait;
use serde_json::{json, Value};
use soroban_orchestrator::client::{
    AccountRecord, BalanceLine, Connector, FaucetApi, GetLedgerEntriesResponse,
    GetTransactionResponse, HorizonApi, LedgerEntryResult, SendTransactionResponse,
    SimulateTransactionResponse, SorobanRpcApi, SubmittedTransaction, TransactionRecord,
    TransactionStatus,
};
use soroban_orchestrator::config::{LedgerConfig, PollPolicy};
use soroban_orchestrator::keys::{self, Keypair};
use soroban_orchestrator::network::Network;
use soroban_orchestrator::xdr::envelope::{envelope_from_base64, transaction_hash};
use soroban_orchestrator::{LedgerError, LedgerOrchestrator, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stellar_xdr::curr::{
    AccountEntry, AccountEntryExt, ExtensionPoint, Hash, InvokeContractArgs, LedgerEntryData,
    LedgerFootprint, LedgerKey, Limits, MuxedAccount, OperationBody, ReadXdr, ScAddress,
    ScSymbol, SequenceNumber, SorobanAuthorizationEntry, SorobanAuthorizedFunction,
    SorobanAuthorizedInvocation, SorobanCredentials, SorobanResources, SorobanTransactionData,
    String32, Thresholds, TransactionEnvelope, Uint256, VecM, WriteXdr,
};
use url::Url;

pub const LEDGER: u32 = 4242;

#[derive(Debug, Clone)]
pub struct MockAccount {
    pub sequence: i64,
    /// `None` means the account carries no native balance line
    pub native_stroops: Option<i64>,
}

#[derive(Default)]
pub struct Counters {
    pub horizon_connections: AtomicUsize,
    pub rpc_connections: AtomicUsize,
    pub faucet_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Scripted in-memory ledger standing in for Horizon, Soroban RPC and the faucet.
pub struct MockLedger {
    pub network: Network,
    pub accounts: Mutex<HashMap<String, MockAccount>>,
    pub transactions: Mutex<HashMap<String, TransactionRecord>>,
    pub simulation: Mutex<SimulateTransactionResponse>,
    pub send_status: Mutex<TransactionStatus>,
    pub poll_script: Mutex<VecDeque<GetTransactionResponse>>,
    /// Returned once the script is exhausted
    pub poll_fallback: Mutex<GetTransactionResponse>,
    pub faucet_fails: Mutex<bool>,
    pub last_sent: Mutex<Option<TransactionEnvelope>>,
    pub endpoints_seen: Mutex<Vec<String>>,
    pub counters: Counters,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            network: Network::testnet(),
            accounts: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
            simulation: Mutex::new(successful_simulation(0)),
            send_status: Mutex::new(TransactionStatus::Pending),
            poll_script: Mutex::new(VecDeque::new()),
            poll_fallback: Mutex::new(GetTransactionResponse::with_status(TransactionStatus::Pending)),
            faucet_fails: Mutex::new(false),
            last_sent: Mutex::new(None),
            endpoints_seen: Mutex::new(Vec::new()),
            counters: Counters::default(),
        })
    }

    pub fn add_account(&self, public_key: &str, sequence: i64, native_stroops: Option<i64>) {
        self.accounts.lock().unwrap().insert(
            public_key.to_string(),
            MockAccount {
                sequence,
                native_stroops,
            },
        );
    }

    pub fn account(&self, public_key: &str) -> Option<MockAccount> {
        self.accounts.lock().unwrap().get(public_key).cloned()
    }

    pub fn set_simulation(&self, simulation: SimulateTransactionResponse) {
        *self.simulation.lock().unwrap() = simulation;
    }

    pub fn set_send_status(&self, status: TransactionStatus) {
        *self.send_status.lock().unwrap() = status;
    }

    pub fn script_polls(&self, responses: impl IntoIterator<Item = GetTransactionResponse>) {
        self.poll_script.lock().unwrap().extend(responses);
    }

    pub fn set_poll_fallback(&self, response: GetTransactionResponse) {
        *self.poll_fallback.lock().unwrap() = response;
    }

    fn submit(&self, envelope_xdr: &str) -> Result<SubmittedTransaction> {
        let TransactionEnvelope::Tx(envelope) = envelope_from_base64(envelope_xdr)? else {
            return Err(problem("tx_malformed", vec![]));
        };
        let tx = &envelope.tx;
        let MuxedAccount::Ed25519(Uint256(source_raw)) = &tx.source_account else {
            return Err(problem("tx_malformed", vec![]));
        };
        let source = stellar_strkey::ed25519::PublicKey(*source_raw).to_string();
        let hash = transaction_hash(tx, &self.network)?;

        let signature_ok = envelope.signatures.iter().any(|sig| {
            <[u8; 64]>::try_from(sig.signature.0.as_slice())
                .map(|raw| keys::verify(&source, &hash, &raw).is_ok())
                .unwrap_or(false)
        });
        if !signature_ok {
            return Err(problem("tx_bad_auth", vec![]));
        }

        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get(&source).cloned() else {
            return Err(problem("tx_no_source_account", vec![]));
        };
        if tx.seq_num.0 != account.sequence + 1 {
            return Err(problem("tx_bad_seq", vec![]));
        }

        let OperationBody::Payment(payment) = &tx.operations[0].body else {
            return Err(problem("tx_failed", vec!["op_not_supported"]));
        };
        let balance = account.native_stroops.unwrap_or(0);
        if payment.amount + i64::from(tx.fee) > balance {
            return Err(problem("tx_failed", vec!["op_underfunded"]));
        }
        let MuxedAccount::Ed25519(Uint256(dest_raw)) = &payment.destination else {
            return Err(problem("tx_failed", vec!["op_malformed"]));
        };
        let destination = stellar_strkey::ed25519::PublicKey(*dest_raw).to_string();
        let Some(dest_account) = accounts.get_mut(&destination) else {
            return Err(problem("tx_failed", vec!["op_no_destination"]));
        };
        dest_account.native_stroops = Some(dest_account.native_stroops.unwrap_or(0) + payment.amount);

        let source_account = accounts.get_mut(&source).expect("source exists");
        source_account.sequence += 1;
        source_account.native_stroops = Some(balance - payment.amount - i64::from(tx.fee));

        let hash_hex = hex::encode(hash);
        self.transactions.lock().unwrap().insert(
            hash_hex.clone(),
            TransactionRecord {
                hash: hash_hex.clone(),
                ledger: LEDGER,
                successful: true,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                source_account: source,
                fee_charged: Some(tx.fee.to_string()),
                operation_count: 1,
                memo_type: "none".to_string(),
                memo: None,
                envelope_xdr: envelope_xdr.to_string(),
                result_xdr: String::new(),
            },
        );

        Ok(SubmittedTransaction {
            hash: hash_hex,
            ledger: LEDGER,
            successful: true,
        })
    }
}

fn problem(transaction_code: &str, operation_codes: Vec<&str>) -> LedgerError {
    LedgerError::PaymentRejected {
        transaction_code: transaction_code.to_string(),
        operation_codes: operation_codes.into_iter().map(str::to_string).collect(),
        result_xdr: None,
    }
}

pub fn format_stroops(stroops: i64) -> String {
    format!("{}.{:07}", stroops / 10_000_000, stroops % 10_000_000)
}

/// Handle implementing every endpoint trait over a shared [`MockLedger`].
#[derive(Clone)]
pub struct MockHandle(pub Arc<MockLedger>);

#[async_trait]
impl HorizonApi for MockHandle {
    async fn account(&self, account_id: &str) -> Result<AccountRecord> {
        let account = self
            .0
            .account(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        let mut balances = vec![BalanceLine {
            asset_type: "credit_alphanum4".to_string(),
            asset_code: Some("USDC".to_string()),
            asset_issuer: Some(Keypair::random().public_key()),
            balance: "10.0000000".to_string(),
        }];
        if let Some(stroops) = account.native_stroops {
            balances.push(BalanceLine::native(format_stroops(stroops)));
        }
        Ok(AccountRecord {
            account_id: account_id.to_string(),
            sequence: account.sequence.to_string(),
            balances,
        })
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord> {
        self.0
            .transactions
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(hash.to_string()))
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmittedTransaction> {
        self.0.counters.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.0.submit(envelope_xdr)
    }
}

#[async_trait]
impl SorobanRpcApi for MockHandle {
    async fn get_ledger_entries(&self, keys: &[String]) -> Result<GetLedgerEntriesResponse> {
        let mut entries = Vec::new();
        for key in keys {
            let LedgerKey::Account(account_key) = LedgerKey::from_xdr_base64(key, Limits::none())? else {
                continue;
            };
            let raw = match &account_key.account_id.0 {
                stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(Uint256(raw)) => *raw,
            };
            let public_key = stellar_strkey::ed25519::PublicKey(raw).to_string();
            if let Some(account) = self.0.account(&public_key) {
                let entry = LedgerEntryData::Account(AccountEntry {
                    account_id: account_key.account_id.clone(),
                    balance: account.native_stroops.unwrap_or(0),
                    seq_num: SequenceNumber(account.sequence),
                    num_sub_entries: 0,
                    inflation_dest: None,
                    flags: 0,
                    home_domain: String32::default(),
                    thresholds: Thresholds([1, 0, 0, 0]),
                    signers: VecM::default(),
                    ext: AccountEntryExt::V0,
                });
                entries.push(LedgerEntryResult {
                    key: key.clone(),
                    xdr: entry.to_xdr_base64(Limits::none())?,
                    last_modified_ledger_seq: LEDGER,
                });
            }
        }
        Ok(GetLedgerEntriesResponse {
            entries: Some(entries),
            latest_ledger: LEDGER,
        })
    }

    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulateTransactionResponse> {
        self.0.counters.simulate_calls.fetch_add(1, Ordering::SeqCst);
        envelope_from_base64(envelope_xdr)?;
        Ok(self.0.simulation.lock().unwrap().clone())
    }

    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SendTransactionResponse> {
        self.0.counters.send_calls.fetch_add(1, Ordering::SeqCst);
        let envelope = envelope_from_base64(envelope_xdr)?;
        let TransactionEnvelope::Tx(v1) = &envelope else {
            return Err(LedgerError::Xdr("unexpected envelope type".to_string()));
        };
        let hash = hex::encode(transaction_hash(&v1.tx, &self.0.network)?);
        *self.0.last_sent.lock().unwrap() = Some(envelope);
        let status = *self.0.send_status.lock().unwrap();
        Ok(SendTransactionResponse {
            status,
            hash,
            error_result_xdr: (status == TransactionStatus::Error).then(|| "AAAAAAAAAGT////7AAAAAA==".to_string()),
            latest_ledger: LEDGER,
        })
    }

    async fn get_transaction(&self, _hash: &str) -> Result<GetTransactionResponse> {
        self.0.counters.poll_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.0.poll_script.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| self.0.poll_fallback.lock().unwrap().clone()))
    }
}

#[async_trait]
impl FaucetApi for MockHandle {
    async fn fund(&self, account_id: &str) -> Result<Value> {
        self.0.counters.faucet_calls.fetch_add(1, Ordering::SeqCst);
        if *self.0.faucet_fails.lock().unwrap() {
            return Err(LedgerError::FundingUnavailable(
                "faucet returned 400 Bad Request: account already funded".to_string(),
            ));
        }
        self.0.add_account(account_id, 1 << 32, Some(10_000 * 10_000_000));
        Ok(json!({ "successful": true, "ledger": LEDGER }))
    }
}

/// Connector handing out [`MockHandle`]s and recording which endpoints were used.
#[derive(Clone)]
pub struct MockConnector {
    pub ledger: Arc<MockLedger>,
}

impl Connector for MockConnector {
    type Horizon = MockHandle;
    type Rpc = MockHandle;
    type Faucet = MockHandle;

    fn horizon(&self, config: &LedgerConfig) -> Result<MockHandle> {
        self.ledger.counters.horizon_connections.fetch_add(1, Ordering::SeqCst);
        self.ledger
            .endpoints_seen
            .lock()
            .unwrap()
            .push(config.horizon_url.to_string());
        Ok(MockHandle(self.ledger.clone()))
    }

    fn soroban_rpc(&self, config: &LedgerConfig) -> Result<MockHandle> {
        self.ledger.counters.rpc_connections.fetch_add(1, Ordering::SeqCst);
        self.ledger
            .endpoints_seen
            .lock()
            .unwrap()
            .push(config.soroban_rpc_url.to_string());
        Ok(MockHandle(self.ledger.clone()))
    }

    fn faucet(&self, _config: &LedgerConfig, _url: &Url) -> Result<MockHandle> {
        Ok(MockHandle(self.ledger.clone()))
    }
}

/// Testnet configuration with a backend signer, a contract and fast polling.
pub fn test_config(backend: &Keypair) -> LedgerConfig {
    LedgerConfig {
        backend_secret_key: Some(backend.secret()),
        contract_id: Some(stellar_strkey::Contract([3u8; 32]).to_string()),
        poll: PollPolicy::new(Duration::from_millis(1), 20),
        ..LedgerConfig::default()
    }
}

/// Orchestrator over a fresh mock ledger whose backend account exists.
pub fn orchestrator() -> (LedgerOrchestrator<MockConnector>, Arc<MockLedger>, Keypair) {
    let ledger = MockLedger::new();
    let backend = Keypair::random();
    ledger.add_account(&backend.public_key(), 100, Some(1_000 * 10_000_000));
    let orchestrator = LedgerOrchestrator::with_connector(
        MockConnector {
            ledger: ledger.clone(),
        },
        test_config(&backend),
    );
    (orchestrator, ledger, backend)
}

pub fn transaction_data() -> SorobanTransactionData {
    SorobanTransactionData {
        ext: ExtensionPoint::V0,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: VecM::default(),
                read_write: VecM::default(),
            },
            instructions: 2_000_000,
            read_bytes: 1_024,
            write_bytes: 0,
        },
        resource_fee: 58_181,
    }
}

pub fn successful_simulation(min_resource_fee: i64) -> SimulateTransactionResponse {
    SimulateTransactionResponse {
        transaction_data: Some(
            transaction_data()
                .to_xdr_base64(Limits::none())
                .expect("transaction data encodes"),
        ),
        min_resource_fee: Some(min_resource_fee.to_string()),
        results: vec![Default::default()],
        latest_ledger: LEDGER,
        ..Default::default()
    }
}

/// An auth entry signed by the transaction source, as simulation reports it
/// for a plain contract call.
pub fn source_account_auth(method: &str) -> SorobanAuthorizationEntry {
    SorobanAuthorizationEntry {
        credentials: SorobanCredentials::SourceAccount,
        root_invocation: SorobanAuthorizedInvocation {
            function: SorobanAuthorizedFunction::ContractFn(InvokeContractArgs {
                contract_address: ScAddress::Contract(Hash([7; 32])),
                function_name: ScSymbol(method.as_bytes().to_vec().try_into().expect("symbol")),
                args: VecM::default(),
            }),
            sub_invocations: VecM::default(),
        },
    }
}

pub fn simulation_with_auth(entries: &[SorobanAuthorizationEntry]) -> SimulateTransactionResponse {
    let mut simulation = successful_simulation(100);
    simulation.results[0].auth = entries
        .iter()
        .map(|entry| entry.to_xdr_base64(Limits::none()).expect("auth entry encodes"))
        .collect();
    simulation
}

pub fn success_with_return(return_value_xdr: &str) -> GetTransactionResponse {
    GetTransactionResponse {
        return_value: Some(return_value_xdr.to_string()),
        ledger: Some(LEDGER),
        ..GetTransactionResponse::with_status(TransactionStatus::Success)
    }
}

pub fn pending() -> GetTransactionResponse {
    GetTransactionResponse::with_status(TransactionStatus::Pending)
}
