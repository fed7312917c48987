//! # Wallet Key Store
//!
//! The transaction pipeline never touches key storage directly. It asks a
//! [`WalletKeyStore`] for signer handles and gets back objects that can
//! sign a 32-byte hash, nothing more. Whether the key lives in memory, in a
//! secure enclave, or on a hardware device is the store's business.
//!
//! [`InMemoryKeyStore`] is the simple implementation used by the CLI and
//! the tests.
//!
//! ## Thread Safety
//!
//! Stores are shared between concurrent submissions, so they must be
//! `Send + Sync` and safe for concurrent reads. The in-memory store keeps
//! its accounts behind a `parking_lot::RwLock`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::crypto::keys::{Keypair, PublicKey, SignatureWithPublicKey};
use crate::manifest::address::Address;
use crate::network::NetworkId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a signer can report.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The user (or the device) declined to sign.
    #[error("signing rejected: {0}")]
    Rejected(String),

    /// The key behind this handle is not reachable right now.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
}

// ---------------------------------------------------------------------------
// Signer handles
// ---------------------------------------------------------------------------

/// A handle able to sign on behalf of one on-ledger entity.
pub trait TransactionSigner: Send + Sync {
    /// The account or identity this signer controls.
    fn address(&self) -> Address;

    fn public_key(&self) -> PublicKey;

    /// Sign a 32-byte transaction hash.
    fn sign(&self, hash: &[u8; 32]) -> Result<SignatureWithPublicKey, SigningError>;
}

/// A signer backed by an Ed25519 keypair held in memory.
pub struct LocalSigner {
    address: Address,
    keypair: Keypair,
}

impl LocalSigner {
    /// A signer for the virtual account of `keypair` on `network`.
    pub fn account(keypair: Keypair, network: NetworkId) -> Self {
        Self {
            address: Address::virtual_account(&keypair.public_key(), network),
            keypair,
        }
    }

    /// A signer for an explicit address, e.g. a securified account.
    pub fn with_address(address: Address, keypair: Keypair) -> Self {
        Self { address, keypair }
    }
}

impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    fn sign(&self, hash: &[u8; 32]) -> Result<SignatureWithPublicKey, SigningError> {
        Ok(self.keypair.sign_with_public_key(hash))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .field("keypair", &self.keypair)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Key store
// ---------------------------------------------------------------------------

/// What the transaction pipeline needs from the wallet.
#[async_trait]
pub trait WalletKeyStore: Send + Sync {
    /// Signers for whichever of `addresses` the wallet controls on
    /// `network`. Unknown addresses are left out.
    async fn signers_for_addresses(
        &self,
        network: NetworkId,
        addresses: &[Address],
    ) -> Vec<Arc<dyn TransactionSigner>>;

    /// Accounts on the current network, in the order the user created them.
    async fn accounts(&self) -> Vec<Address>;

    /// The network the wallet is currently pointed at.
    async fn current_network_id(&self) -> NetworkId;
}

/// Keys held in process memory, for one network.
pub struct InMemoryKeyStore {
    network: NetworkId,
    signers: RwLock<Vec<Arc<LocalSigner>>>,
}

impl InMemoryKeyStore {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            signers: RwLock::new(Vec::new()),
        }
    }

    /// Add the virtual account controlled by `keypair` and return its
    /// address. Adding the same key twice is a no-op.
    pub fn add_account(&self, keypair: Keypair) -> Address {
        self.add_signer(LocalSigner::account(keypair, self.network))
    }

    /// Add an arbitrary signer, e.g. one for an identity.
    pub fn add_signer(&self, signer: LocalSigner) -> Address {
        let address = signer.address();
        let mut signers = self.signers.write();
        if !signers.iter().any(|s| s.address() == address) {
            signers.push(Arc::new(signer));
        }
        address
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }
}

#[async_trait]
impl WalletKeyStore for InMemoryKeyStore {
    async fn signers_for_addresses(
        &self,
        network: NetworkId,
        addresses: &[Address],
    ) -> Vec<Arc<dyn TransactionSigner>> {
        if network != self.network {
            return Vec::new();
        }
        self.signers
            .read()
            .iter()
            .filter(|s| addresses.contains(&s.address()))
            .map(|s| s.clone() as Arc<dyn TransactionSigner>)
            .collect()
    }

    async fn accounts(&self) -> Vec<Address> {
        self.signers
            .read()
            .iter()
            .map(|s| s.address())
            .filter(Address::is_account)
            .collect()
    }

    async fn current_network_id(&self) -> NetworkId {
        self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_signer_signs_hash() {
        let signer = LocalSigner::account(Keypair::from_seed(&[1u8; 32]), NetworkId::STOKENET);
        let hash = [7u8; 32];
        let sig = signer.sign(&hash).unwrap();
        assert_eq!(sig.public_key, signer.public_key());
        assert!(sig.verify(&hash));
        assert!(signer.address().is_account());
    }

    #[tokio::test]
    async fn store_returns_only_requested_signers() {
        let store = InMemoryKeyStore::new(NetworkId::STOKENET);
        let a = store.add_account(Keypair::from_seed(&[1u8; 32]));
        let b = store.add_account(Keypair::from_seed(&[2u8; 32]));

        let found = store.signers_for_addresses(NetworkId::STOKENET, &[b]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address(), b);

        assert_eq!(store.accounts().await, vec![a, b]);
        assert_eq!(store.current_network_id().await, NetworkId::STOKENET);
    }

    #[tokio::test]
    async fn other_network_yields_nothing() {
        let store = InMemoryKeyStore::new(NetworkId::STOKENET);
        let a = store.add_account(Keypair::from_seed(&[1u8; 32]));
        assert!(store
            .signers_for_addresses(NetworkId::MAINNET, &[a])
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_keys_are_ignored() {
        let store = InMemoryKeyStore::new(NetworkId::STOKENET);
        store.add_account(Keypair::from_seed(&[1u8; 32]));
        store.add_account(Keypair::from_seed(&[1u8; 32]));
        assert_eq!(store.accounts().await.len(), 1);
    }

    #[tokio::test]
    async fn identities_are_not_accounts() {
        let store = InMemoryKeyStore::new(NetworkId::STOKENET);
        let kp = Keypair::from_seed(&[3u8; 32]);
        let identity = Address::virtual_identity(&kp.public_key(), NetworkId::STOKENET);
        store.add_signer(LocalSigner::with_address(identity, kp));
        assert!(store.accounts().await.is_empty());
        assert_eq!(
            store
                .signers_for_addresses(NetworkId::STOKENET, &[identity])
                .await
                .len(),
            1
        );
    }
}
