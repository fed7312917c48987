//! # Signer Resolution
//!
//! Works out who has to sign a manifest by reading it, not by asking the
//! user. An account has to sign when the manifest calls one of its
//! auth-protected methods (withdraw, lock_fee, deposit settings, ...).
//! Third-party deposits and metadata writes do not count; a caller that
//! needs an extra entity to sign passes it to [`NotaryAndSigners::resolve`].
//!
//! The first resolved signer also notarizes. When nothing in the manifest
//! needs a signature, the wallet's first account steps in as notary.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::TransactionApprovalFailure;
use crate::manifest::address::Address;
use crate::manifest::TransactionManifest;
use crate::network::NetworkId;
use crate::wallet::{TransactionSigner, WalletKeyStore};

/// Addresses whose owners must sign `manifest`, deduplicated, in the order
/// they first appear.
///
/// Opaque manifests cannot be analysed and yield an empty list.
pub fn addresses_requiring_auth(manifest: &TransactionManifest) -> Vec<Address> {
    let Some(instructions) = manifest.structured() else {
        warn!("manifest is opaque; signer analysis skipped");
        return Vec::new();
    };

    let mut addresses: Vec<Address> = Vec::new();
    for address in instructions.iter().filter_map(|i| i.auth_target()) {
        if !addresses.contains(address) {
            addresses.push(*address);
        }
    }
    addresses
}

/// Fetch signers for `addresses` from the key store, in the order of
/// `addresses`. Addresses the wallet holds no key for are skipped.
pub async fn signers_for(
    store: &dyn WalletKeyStore,
    network: NetworkId,
    addresses: &[Address],
) -> Vec<Arc<dyn TransactionSigner>> {
    if addresses.is_empty() {
        return Vec::new();
    }
    let available = store.signers_for_addresses(network, addresses).await;
    addresses
        .iter()
        .filter_map(|address| {
            available
                .iter()
                .find(|signer| signer.address() == *address)
                .cloned()
        })
        .collect()
}

/// Account that pays the fee for `manifest`: the first account that has to
/// sign anyway, or the wallet's first account.
pub async fn select_fee_payer(
    store: &dyn WalletKeyStore,
    network: NetworkId,
    manifest: &TransactionManifest,
) -> Result<Address, TransactionApprovalFailure> {
    let required = addresses_requiring_auth(manifest);
    if let Some(signer) = signers_for(store, network, &required).await.first() {
        return Ok(signer.address());
    }
    store
        .accounts()
        .await
        .first()
        .copied()
        .ok_or(TransactionApprovalFailure::FailedToFindAccountToLockFee)
}

/// The notary plus the accounts that sign the intent.
#[derive(Clone)]
pub struct NotaryAndSigners {
    pub notary: Arc<dyn TransactionSigner>,
    pub signers: Vec<Arc<dyn TransactionSigner>>,
}

impl NotaryAndSigners {
    /// Resolve signers for a final (fee-locked) manifest. `extra` are
    /// appended after the analysed signers, skipping duplicates.
    pub async fn resolve(
        store: &dyn WalletKeyStore,
        network: NetworkId,
        manifest: &TransactionManifest,
        extra: &[Address],
    ) -> Result<Self, TransactionApprovalFailure> {
        let mut required = addresses_requiring_auth(manifest);
        for address in extra {
            if !required.contains(address) {
                required.push(*address);
            }
        }
        let mut signers = signers_for(store, network, &required).await;

        if signers.len() < required.len() {
            warn!(
                required = required.len(),
                resolved = signers.len(),
                "wallet holds no key for some accounts requiring auth"
            );
        }

        if signers.is_empty() {
            let fallback = store
                .accounts()
                .await
                .first()
                .copied()
                .ok_or(TransactionApprovalFailure::FailedToFindAccountToLockFee)?;
            signers = signers_for(store, network, &[fallback]).await;
        }

        let notary = signers
            .first()
            .cloned()
            .ok_or(TransactionApprovalFailure::FailedToFindAccountToLockFee)?;

        debug!(
            notary = %notary.address(),
            signers = signers.len(),
            "signers resolved"
        );
        Ok(Self { notary, signers })
    }

    pub fn signer_addresses(&self) -> Vec<Address> {
        self.signers.iter().map(|s| s.address()).collect()
    }
}
