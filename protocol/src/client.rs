//! # Transaction Client
//!
//! The single entry point the application calls:
//!
//! ```text
//! manifest ──► prepare ──────────────────────────────► PreparedTransaction
//!               network check                              │
//!               fee payer + lock_fee at index 0            │
//!               signers + notary                           ▼
//!               header (epoch, nonce)                   submit ──► tx id
//!               compile, sign, notarize                    │   duplicate ──► error, no polling
//!                                                          └─► poll until terminal
//! ```
//!
//! `prepare` does no I/O besides the epoch query, so callers that want to
//! show the transaction id before sending can split the two steps.
//! A flow cancelled after submission is picked up with
//! [`TransactionClient::resume_polling`], never by preparing again.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::TransactionApprovalFailure;
use crate::gateway::poll::poll_until_terminal;
use crate::gateway::state::SubmissionTracker;
use crate::gateway::types::{LedgerInfo, TransactionGateway};
use crate::manifest::address::Address;
use crate::manifest::TransactionManifest;
use crate::metrics::ClientMetrics;
use crate::transaction::fee::inject_lock_fee;
use crate::transaction::header::{HeaderBuilder, NonceSource, TransactionHeader};
use crate::transaction::intent::{
    self, CompiledNotarizedIntent, NotarizedTransaction, TransactionId, TransactionIntent,
    TransactionMessage,
};
use crate::transaction::signers::{select_fee_payer, NotaryAndSigners};
use crate::wallet::WalletKeyStore;

/// A notarized transaction that has not been submitted yet.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub tx_id: TransactionId,
    pub header: TransactionHeader,
    /// The manifest as signed, fee lock included.
    pub manifest: TransactionManifest,
    pub fee_payer: Option<Address>,
    pub signers: Vec<Address>,
    pub notarized: NotarizedTransaction,
    pub compiled: CompiledNotarizedIntent,
}

/// Per-transaction knobs for [`TransactionClient::prepare_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Note attached to the intent.
    pub message: TransactionMessage,
    /// Prepend a `lock_fee` call on the fee payer. Off for manifests that
    /// already lock their fee elsewhere, such as the faucet template.
    pub lock_fee: bool,
    /// Entities that must sign although no auth-protected call names them,
    /// such as the target of an owner-key rotation.
    pub extra_signers: Vec<Address>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            message: TransactionMessage::None,
            lock_fee: true,
            extra_signers: Vec::new(),
        }
    }
}

/// Builds, notarizes, submits and tracks transactions for one wallet.
pub struct TransactionClient {
    keystore: Arc<dyn WalletKeyStore>,
    gateway: Arc<dyn TransactionGateway>,
    headers: HeaderBuilder,
    config: ClientConfig,
    metrics: Option<ClientMetrics>,
}

impl TransactionClient {
    pub fn new(
        keystore: Arc<dyn WalletKeyStore>,
        ledger: Arc<dyn LedgerInfo>,
        gateway: Arc<dyn TransactionGateway>,
        config: ClientConfig,
    ) -> Self {
        let headers = HeaderBuilder::new(ledger);
        Self {
            keystore,
            gateway,
            headers,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the header nonce source, e.g. with a seeded generator.
    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.headers = self.headers.with_nonce_source(nonces);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_ref()
    }

    /// Prepare, submit, and wait for the ledger's verdict.
    pub async fn sign_and_submit(
        &self,
        manifest: &TransactionManifest,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        self.sign_and_submit_with(manifest, SubmitOptions::default())
            .await
    }

    pub async fn sign_and_submit_with(
        &self,
        manifest: &TransactionManifest,
        options: SubmitOptions,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        let prepared = self.prepare_with(manifest, options).await?;
        self.submit(&prepared).await
    }

    /// Run every pre-submission stage on `manifest`.
    pub async fn prepare(
        &self,
        manifest: &TransactionManifest,
    ) -> Result<PreparedTransaction, TransactionApprovalFailure> {
        self.prepare_with(manifest, SubmitOptions::default()).await
    }

    /// Like [`prepare`](Self::prepare), with explicit options.
    pub async fn prepare_with(
        &self,
        manifest: &TransactionManifest,
        options: SubmitOptions,
    ) -> Result<PreparedTransaction, TransactionApprovalFailure> {
        let result = self.build_notarized(manifest, options).await;
        self.observe(result)
    }

    async fn build_notarized(
        &self,
        manifest: &TransactionManifest,
        options: SubmitOptions,
    ) -> Result<PreparedTransaction, TransactionApprovalFailure> {
        let wallet_network = self.keystore.current_network_id().await;
        let network = manifest.network_id();
        if network != wallet_network {
            return Err(TransactionApprovalFailure::WrongNetwork {
                wallet_network,
                request_network: network,
            });
        }

        let (manifest, fee_payer) = if manifest.is_opaque() {
            if !self.config.allow_opaque_manifests {
                return Err(TransactionApprovalFailure::ConvertManifest {
                    reason: "opaque manifests cannot be fee-locked or analysed for signers"
                        .to_string(),
                });
            }
            warn!("submitting opaque manifest without fee lock or signer analysis");
            (manifest.clone(), None)
        } else if !options.lock_fee {
            debug!("fee lock skipped; manifest pays its own fee");
            (manifest.clone(), None)
        } else {
            let payer = select_fee_payer(self.keystore.as_ref(), network, manifest).await?;
            (
                inject_lock_fee(manifest, payer, self.config.lock_fee),
                Some(payer),
            )
        };

        let parties = NotaryAndSigners::resolve(
            self.keystore.as_ref(),
            network,
            &manifest,
            &options.extra_signers,
        )
        .await?;
        let header = self
            .headers
            .build(network, &parties.notary.public_key())
            .await?;

        let tx_intent =
            TransactionIntent::new(header.clone(), manifest.clone()).with_message(options.message);
        let compiled_intent = tx_intent.compile()?;
        let tx_id = compiled_intent.transaction_id();
        let signed = intent::sign(tx_intent, &compiled_intent, &parties.signers)?;
        let (notarized, compiled) = intent::notarize(signed, parties.notary.as_ref())?;

        info!(
            tx_id = %tx_id,
            network = %network,
            signers = parties.signers.len(),
            bytes = compiled.as_bytes().len(),
            "transaction notarized"
        );
        Ok(PreparedTransaction {
            tx_id,
            header,
            manifest,
            fee_payer,
            signers: parties.signer_addresses(),
            notarized,
            compiled,
        })
    }

    /// Submit once, then poll for the verdict. Never resubmits.
    pub async fn submit(
        &self,
        prepared: &PreparedTransaction,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        let mut tracker = SubmissionTracker::new(prepared.tx_id);
        let result = self.submit_tracked(prepared, &mut tracker).await;
        debug!(tx_id = %tracker.tx_id(), state = ?tracker.state(), "submission finished");
        self.observe(result)
    }

    async fn submit_tracked(
        &self,
        prepared: &PreparedTransaction,
        tracker: &mut SubmissionTracker,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        let tx_id = prepared.tx_id;
        let response = self
            .gateway
            .submit(&prepared.compiled.to_hex())
            .await
            .map_err(|e| TransactionApprovalFailure::SubmitNotarizedTransaction {
                reason: e.to_string(),
            })?;
        tracker.mark_submitted();
        if let Some(m) = &self.metrics {
            m.transactions_submitted_total.inc();
        }

        if response.duplicate {
            tracker.mark_duplicate();
            if let Some(m) = &self.metrics {
                m.transactions_duplicate_total.inc();
            }
            return Err(TransactionApprovalFailure::InvalidTxDuplicate { tx_id });
        }

        info!(tx_id = %tx_id, "transaction submitted; polling status");
        self.poll(tracker).await
    }

    /// Re-enter polling for a transaction submitted earlier.
    pub async fn resume_polling(
        &self,
        tx_id: TransactionId,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        info!(tx_id = %tx_id, "resuming status polling");
        let mut tracker = SubmissionTracker::resumed(tx_id);
        let result = self.poll(&mut tracker).await;
        self.observe(result)
    }

    async fn poll(
        &self,
        tracker: &mut SubmissionTracker,
    ) -> Result<TransactionId, TransactionApprovalFailure> {
        tracker.mark_polling();
        let outcome = poll_until_terminal(
            self.gateway.as_ref(),
            tracker.tx_id(),
            &self.config.poll,
            self.metrics.as_ref(),
        )
        .await;
        tracker.finish(&outcome);
        outcome
    }

    fn observe<T>(
        &self,
        result: Result<T, TransactionApprovalFailure>,
    ) -> Result<T, TransactionApprovalFailure> {
        if let Err(failure) = &result {
            let category = failure.wallet_error_type();
            warn!(category = %category, error = %failure, "transaction failed");
            if let Some(m) = &self.metrics {
                m.record_failure(category);
            }
        }
        result
    }
}
