//! End-to-end tests for the transaction pipeline.
//!
//! Each test drives a real `TransactionClient` (real key store, real
//! compiler and notarizer) against scripted fakes of the two ledger
//! collaborators. The fakes record every call so the tests can assert not
//! just on the result but on what the client asked the gateway to do.
//!
//! Polling tests run on a paused tokio clock, so the two-second poll delay
//! costs nothing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use quill_protocol::client::TransactionClient;
use quill_protocol::config::{ClientConfig, TIP_PERCENTAGE};
use quill_protocol::crypto::keys::Keypair;
use quill_protocol::error::{TransactionApprovalFailure, WalletErrorType};
use quill_protocol::gateway::{
    GatewayError, LedgerInfo, LedgerStatus, PollStrategy, SubmitResponse, TransactionGateway,
};
use quill_protocol::manifest::address::Address;
use quill_protocol::manifest::decimal::Decimal;
use quill_protocol::manifest::{ManifestBuilder, TransactionManifest};
use quill_protocol::metrics::ClientMetrics;
use quill_protocol::network::{known_addresses, NetworkId};
use quill_protocol::transaction::fee::lock_fee_instruction;
use quill_protocol::transaction::{Epoch, NotarizedTransaction, TransactionId};
use quill_protocol::wallet::InMemoryKeyStore;

const NET: NetworkId = NetworkId::STOKENET;

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

struct FakeLedger {
    epoch: Option<u64>,
}

#[async_trait]
impl LedgerInfo for FakeLedger {
    async fn current_epoch(&self) -> Result<Epoch, GatewayError> {
        self.epoch
            .map(Epoch)
            .ok_or_else(|| GatewayError::Transport("ledger unreachable".into()))
    }
}

/// Answers submissions with a fixed response and status queries from a
/// script. Once the script runs dry every further query sees `Pending`.
#[derive(Default)]
struct FakeGateway {
    duplicate: bool,
    statuses: Mutex<VecDeque<Result<LedgerStatus, GatewayError>>>,
    submitted: Mutex<Vec<String>>,
    polls: AtomicU32,
}

impl FakeGateway {
    fn answering(statuses: Vec<LedgerStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    fn duplicate() -> Self {
        Self {
            duplicate: true,
            ..Self::default()
        }
    }

    fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    fn submissions(&self) -> Vec<String> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl TransactionGateway for FakeGateway {
    async fn submit(&self, notarized_hex: &str) -> Result<SubmitResponse, GatewayError> {
        self.submitted.lock().push(notarized_hex.to_string());
        Ok(SubmitResponse {
            duplicate: self.duplicate,
        })
    }

    async fn status(&self, _tx_id: &TransactionId) -> Result<LedgerStatus, GatewayError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or(Ok(LedgerStatus::Pending))
    }
}

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Wallet {
    store: Arc<InMemoryKeyStore>,
    accounts: Vec<Address>,
}

/// A key store holding `n` accounts derived from fixed seeds.
fn wallet(n: u8) -> Wallet {
    let store = Arc::new(InMemoryKeyStore::new(NET));
    let accounts = (1..=n)
        .map(|seed| store.add_account(Keypair::from_seed(&[seed; 32])))
        .collect();
    Wallet { store, accounts }
}

fn client_with(
    wallet: &Wallet,
    epoch: Option<u64>,
    gateway: Arc<FakeGateway>,
    config: ClientConfig,
) -> TransactionClient {
    TransactionClient::new(
        wallet.store.clone(),
        Arc::new(FakeLedger { epoch }),
        gateway,
        config,
    )
}

fn client(wallet: &Wallet, gateway: Arc<FakeGateway>) -> TransactionClient {
    client_with(wallet, Some(100), gateway, ClientConfig::default())
}

/// One withdraw from `from`, deposited into `to`.
fn transfer(from: Address, to: Address, amount: u64) -> TransactionManifest {
    let xrd = known_addresses(NET).native_token;
    let mut builder = ManifestBuilder::new();
    let bucket = builder.new_bucket();
    builder
        .withdraw(from, xrd, Decimal::from(amount))
        .take_all_from_worktop(xrd, &bucket)
        .try_deposit_or_abort(to, &bucket)
        .build(NET)
        .expect("valid transfer manifest")
}

fn decompile(hex_payload: &str) -> NotarizedTransaction {
    let bytes = hex::decode(hex_payload).expect("submitted payload is hex");
    NotarizedTransaction::decompile(&bytes).expect("submitted payload decodes")
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transfer_commits_after_four_polls() {
    let w = wallet(2);
    let (a, b) = (w.accounts[0], w.accounts[1]);
    let gateway = Arc::new(FakeGateway::answering(vec![
        LedgerStatus::Pending,
        LedgerStatus::Pending,
        LedgerStatus::Pending,
        LedgerStatus::CommittedSuccess,
    ]));
    let client = client(&w, gateway.clone());

    let manifest = transfer(a, b, 25);
    let prepared = client.prepare(&manifest).await.unwrap();

    assert_eq!(prepared.header.start_epoch_inclusive, Epoch(100));
    assert_eq!(prepared.header.end_epoch_exclusive, Epoch(110));
    assert_eq!(prepared.header.tip_percentage, TIP_PERCENTAGE);
    let instructions = prepared.manifest.structured().unwrap();
    assert_eq!(instructions[0], lock_fee_instruction(a, Decimal::from(10u64)));
    assert_eq!(&instructions[1..], manifest.structured().unwrap());
    assert!(!prepared.compiled.as_bytes().is_empty());

    let tx_id = client.submit(&prepared).await.unwrap();
    assert_eq!(tx_id, prepared.tx_id);
    assert_eq!(gateway.polls(), 4);

    let submissions = gateway.submissions();
    assert_eq!(submissions.len(), 1);
    let on_the_wire = decompile(&submissions[0]);
    assert_eq!(on_the_wire.transaction_id().unwrap(), tx_id);
    assert!(on_the_wire.verify_signatures().unwrap());
}

#[tokio::test(start_paused = true)]
async fn sign_and_submit_returns_transaction_id() {
    let w = wallet(1);
    let a = w.accounts[0];
    let gateway = Arc::new(FakeGateway::answering(vec![LedgerStatus::CommittedSuccess]));
    let metrics = ClientMetrics::new().unwrap();
    let client = client(&w, gateway.clone()).with_metrics(metrics.clone());

    let tx_id = client.sign_and_submit(&transfer(a, a, 1)).await.unwrap();

    assert_eq!(decompile(&gateway.submissions()[0]).transaction_id().unwrap(), tx_id);
    assert_eq!(metrics.transactions_submitted_total.get(), 1);
    assert_eq!(metrics.status_polls_total.get(), 1);
    assert_eq!(metrics.submission_duration_seconds.get_sample_count(), 1);
}

// ---------------------------------------------------------------------------
// Submission outcomes
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn duplicate_submission_is_never_polled() {
    let w = wallet(1);
    let a = w.accounts[0];
    let gateway = Arc::new(FakeGateway::duplicate());
    let metrics = ClientMetrics::new().unwrap();
    let client = client(&w, gateway.clone()).with_metrics(metrics.clone());

    let prepared = client.prepare(&transfer(a, a, 1)).await.unwrap();
    let err = client.submit(&prepared).await.unwrap_err();

    assert_eq!(
        err,
        TransactionApprovalFailure::InvalidTxDuplicate {
            tx_id: prepared.tx_id
        }
    );
    assert_eq!(gateway.polls(), 0);
    assert_eq!(
        err.wallet_error_type(),
        WalletErrorType::SubmittedTransactionWasDuplicate
    );
    assert_eq!(err.dapp_message(), Some(format!("TXID: {}", prepared.tx_id)));
    assert_eq!(metrics.transactions_duplicate_total.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_stops_at_max_tries() {
    let w = wallet(1);
    let a = w.accounts[0];
    let gateway = Arc::new(FakeGateway::default());
    let config = ClientConfig {
        poll: PollStrategy::new(5, Duration::from_millis(500)),
        ..ClientConfig::default()
    };
    let client = client_with(&w, Some(100), gateway.clone(), config);

    let err = client.sign_and_submit(&transfer(a, a, 1)).await.unwrap_err();

    assert!(matches!(
        err,
        TransactionApprovalFailure::FailedToPollTxStatus { .. }
    ));
    assert_eq!(gateway.polls(), 5);
    assert_eq!(
        err.wallet_error_type(),
        WalletErrorType::FailedToPollSubmittedTransaction
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_transaction_surfaces_rejection() {
    let w = wallet(1);
    let a = w.accounts[0];
    let gateway = Arc::new(FakeGateway::answering(vec![
        LedgerStatus::Pending,
        LedgerStatus::Rejected,
    ]));
    let metrics = ClientMetrics::new().unwrap();
    let client = client(&w, gateway.clone()).with_metrics(metrics.clone());

    let err = client.sign_and_submit(&transfer(a, a, 1)).await.unwrap_err();

    assert!(matches!(err, TransactionApprovalFailure::GatewayRejected { .. }));
    assert_eq!(gateway.polls(), 2);
    assert_eq!(
        metrics
            .transaction_failures_total
            .with_label_values(&["submitted_transaction_has_rejected_transaction_status"])
            .get(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn resume_polling_never_resubmits() {
    let w = wallet(1);
    let gateway = Arc::new(FakeGateway::answering(vec![
        LedgerStatus::Pending,
        LedgerStatus::CommittedFailure,
    ]));
    let client = client(&w, gateway.clone());
    let tx_id = TransactionId::of(b"submitted before the app was killed");

    let err = client.resume_polling(tx_id).await.unwrap_err();

    assert_eq!(
        err,
        TransactionApprovalFailure::GatewayCommittedFailure { tx_id }
    );
    assert!(gateway.submissions().is_empty());
    assert_eq!(gateway.polls(), 2);
}

// ---------------------------------------------------------------------------
// Signers and headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signers_are_exactly_the_withdrawing_accounts() {
    let w = wallet(3);
    let (a, b, c) = (w.accounts[0], w.accounts[1], w.accounts[2]);
    let xrd = known_addresses(NET).native_token;

    let mut builder = ManifestBuilder::new();
    let bucket = builder.new_bucket();
    let manifest = builder
        .withdraw(a, xrd, Decimal::from(5u64))
        .withdraw(b, xrd, Decimal::from(7u64))
        .take_all_from_worktop(xrd, &bucket)
        .try_deposit_or_abort(c, &bucket)
        .build(NET)
        .unwrap();

    let prepared = client(&w, Arc::new(FakeGateway::default()))
        .prepare(&manifest)
        .await
        .unwrap();

    assert_eq!(prepared.signers, vec![a, b]);
    assert_eq!(prepared.fee_payer, Some(a));

    let signatures = &prepared.notarized.signed_intent.intent_signatures;
    assert_eq!(signatures.len(), 2);
    let tx_id = prepared.tx_id;
    for sig in signatures {
        assert!(sig.verify(tx_id.as_bytes()));
    }
    assert_eq!(
        prepared.header.notary_public_key,
        Keypair::from_seed(&[1u8; 32]).public_key()
    );
}

#[tokio::test]
async fn every_build_draws_a_fresh_nonce() {
    let w = wallet(1);
    let a = w.accounts[0];
    let client = client(&w, Arc::new(FakeGateway::default()));
    let manifest = transfer(a, a, 1);

    let first = client.prepare(&manifest).await.unwrap();
    let second = client.prepare(&manifest).await.unwrap();

    assert_ne!(first.header.nonce, second.header.nonce);
    assert_ne!(first.tx_id, second.tx_id);
}

#[tokio::test]
async fn seeded_nonce_source_makes_builds_reproducible() {
    let w = wallet(1);
    let a = w.accounts[0];
    let manifest = transfer(a, a, 1);
    let seeded = || {
        client(&w, Arc::new(FakeGateway::default()))
            .with_nonce_source(Arc::new(Mutex::new(StdRng::seed_from_u64(42))))
    };

    let first = seeded().prepare(&manifest).await.unwrap();
    let second = seeded().prepare(&manifest).await.unwrap();

    assert_eq!(first.header.nonce, second.header.nonce);
    assert_eq!(first.tx_id, second.tx_id);
}

#[tokio::test(start_paused = true)]
async fn concurrent_flows_share_only_the_key_store() {
    let w = wallet(2);
    let (a, b) = (w.accounts[0], w.accounts[1]);
    let gateway = Arc::new(FakeGateway::answering(vec![
        LedgerStatus::Pending,
        LedgerStatus::Pending,
        LedgerStatus::CommittedSuccess,
        LedgerStatus::CommittedSuccess,
    ]));
    let client = client(&w, gateway.clone());

    let (first, second) = futures::future::join(
        client.sign_and_submit(&transfer(a, b, 1)),
        client.sign_and_submit(&transfer(b, a, 2)),
    )
    .await;

    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first, second);
    let submitted: Vec<_> = gateway
        .submissions()
        .iter()
        .map(|hex| decompile(hex).transaction_id().unwrap())
        .collect();
    assert_eq!(submitted.len(), 2);
    assert!(submitted.contains(&first) && submitted.contains(&second));
}

// ---------------------------------------------------------------------------
// Pre-submission failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manifest_for_another_network_is_refused() {
    let w = wallet(1);
    let xrd = known_addresses(NetworkId::MAINNET).native_token;
    let faucet = known_addresses(NetworkId::MAINNET).faucet;
    let manifest = ManifestBuilder::new()
        .faucet_free(faucet)
        .assert_worktop_contains(xrd, Decimal::ONE)
        .build(NetworkId::MAINNET)
        .unwrap();
    let gateway = Arc::new(FakeGateway::default());

    let err = client(&w, gateway.clone())
        .sign_and_submit(&manifest)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransactionApprovalFailure::WrongNetwork {
            wallet_network: NET,
            request_network: NetworkId::MAINNET,
        }
    );
    assert_eq!(
        err.dapp_message().unwrap(),
        "Wallet is using network ID: 2, request sent specified network ID: 1"
    );
    assert!(gateway.submissions().is_empty());
}

#[tokio::test]
async fn opaque_manifest_is_refused_by_default() {
    let w = wallet(1);
    let gateway = Arc::new(FakeGateway::default());
    let opaque = TransactionManifest::opaque(NET, "CALL_METHOD ...;", vec![]);

    let err = client(&w, gateway.clone())
        .sign_and_submit(&opaque)
        .await
        .unwrap_err();

    assert!(matches!(err, TransactionApprovalFailure::ConvertManifest { .. }));
    assert_eq!(
        err.wallet_error_type(),
        WalletErrorType::FailedToPrepareTransaction
    );
    assert!(gateway.submissions().is_empty());
}

#[tokio::test]
async fn unreachable_ledger_fails_before_submission() {
    let w = wallet(1);
    let a = w.accounts[0];
    let gateway = Arc::new(FakeGateway::default());
    let client = client_with(&w, None, gateway.clone(), ClientConfig::default());

    let err = client.sign_and_submit(&transfer(a, a, 1)).await.unwrap_err();

    assert!(matches!(err, TransactionApprovalFailure::GetEpoch { .. }));
    assert!(gateway.submissions().is_empty());
    assert_eq!(gateway.polls(), 0);
}
