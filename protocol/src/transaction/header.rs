//! # Transaction Header
//!
//! The header pins a transaction to a network and to a window of epochs,
//! and names the notary. It is built fresh for every attempt:
//!
//! ```text
//! current epoch ──► start_epoch_inclusive
//!                   end_epoch_exclusive = start + EPOCH_WINDOW
//! secure RNG    ──► nonce (8 bytes, little-endian u64)
//! notary key    ──► notary_public_key
//! ```
//!
//! The nonce source is injected rather than global so tests can drive the
//! builder with a seeded generator.

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::{
    COST_UNIT_LIMIT, EPOCH_WINDOW, NONCE_LENGTH, NOTARY_IS_SIGNATORY, TIP_PERCENTAGE,
    TRANSACTION_VERSION,
};
use crate::crypto::keys::PublicKey;
use crate::error::TransactionApprovalFailure;
use crate::gateway::types::LedgerInfo;
use crate::network::NetworkId;

/// The ledger's logical clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn checked_add(self, epochs: u64) -> Option<Epoch> {
        self.0.checked_add(epochs).map(Epoch)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the ledger needs to know about a transaction besides its
/// manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub version: u8,
    pub network_id: NetworkId,
    pub start_epoch_inclusive: Epoch,
    pub end_epoch_exclusive: Epoch,
    pub nonce: u64,
    pub notary_public_key: PublicKey,
    pub notary_is_signatory: bool,
    pub cost_unit_limit: u32,
    pub tip_percentage: u16,
}

impl TransactionHeader {
    /// Multi-line rendering for debug logs.
    pub fn to_pretty_string(&self) -> String {
        format!(
            "[Start Epoch]         => {}\n\
             [End Epoch]           => {}\n\
             [Network id]          => {}\n\
             [Nonce]               => {}\n\
             [Notary is signatory] => {}\n\
             [Tip %]               => {}\n",
            self.start_epoch_inclusive,
            self.end_epoch_exclusive,
            self.network_id,
            self.nonce,
            self.notary_is_signatory,
            self.tip_percentage,
        )
    }
}

// ---------------------------------------------------------------------------
// Nonce sources
// ---------------------------------------------------------------------------

/// Source of anti-replay nonces. Must be cryptographically secure.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Draws nonces from the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn next_nonce(&self) -> u64 {
        nonce_from(&mut OsRng)
    }
}

/// Any seedable CSPRNG behind a lock works too, e.g. `Mutex<StdRng>` in
/// tests.
impl<R> NonceSource for Mutex<R>
where
    R: RngCore + CryptoRng + Send,
{
    fn next_nonce(&self) -> u64 {
        nonce_from(&mut *self.lock())
    }
}

fn nonce_from<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> u64 {
    let mut bytes = [0u8; NONCE_LENGTH];
    rng.fill_bytes(&mut bytes);
    u64::from_le_bytes(bytes)
}

// ---------------------------------------------------------------------------
// HeaderBuilder
// ---------------------------------------------------------------------------

/// Builds headers against the live ledger epoch.
#[derive(Clone)]
pub struct HeaderBuilder {
    ledger: Arc<dyn LedgerInfo>,
    nonces: Arc<dyn NonceSource>,
}

impl HeaderBuilder {
    pub fn new(ledger: Arc<dyn LedgerInfo>) -> Self {
        Self {
            ledger,
            nonces: Arc::new(OsNonceSource),
        }
    }

    /// Replace the nonce source.
    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Build a header for `network` notarized by `notary`.
    ///
    /// Fails with `GetEpoch` when the ledger cannot be asked for the
    /// current epoch, and with `BuildTransactionHeader` when the epoch is so
    /// large the window would overflow.
    pub async fn build(
        &self,
        network: NetworkId,
        notary: &PublicKey,
    ) -> Result<TransactionHeader, TransactionApprovalFailure> {
        let start = self
            .ledger
            .current_epoch()
            .await
            .map_err(|e| TransactionApprovalFailure::GetEpoch {
                reason: e.to_string(),
            })?;
        let end = start
            .checked_add(EPOCH_WINDOW)
            .ok_or_else(|| TransactionApprovalFailure::BuildTransactionHeader {
                reason: format!("epoch {start} + {EPOCH_WINDOW} overflows"),
            })?;

        let header = TransactionHeader {
            version: TRANSACTION_VERSION,
            network_id: network,
            start_epoch_inclusive: start,
            end_epoch_exclusive: end,
            nonce: self.nonces.next_nonce(),
            notary_public_key: *notary,
            notary_is_signatory: NOTARY_IS_SIGNATORY,
            cost_unit_limit: COST_UNIT_LIMIT,
            tip_percentage: TIP_PERCENTAGE,
        };
        debug!(network = %network, "transaction header built\n{}", header.to_pretty_string());
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use crate::gateway::types::GatewayError;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FixedEpoch(Result<u64, ()>);

    #[async_trait]
    impl LedgerInfo for FixedEpoch {
        async fn current_epoch(&self) -> Result<Epoch, GatewayError> {
            self.0
                .map(Epoch)
                .map_err(|_| GatewayError::Transport("connection refused".into()))
        }
    }

    fn builder(epoch: Result<u64, ()>) -> HeaderBuilder {
        HeaderBuilder::new(Arc::new(FixedEpoch(epoch)))
    }

    #[tokio::test]
    async fn end_epoch_is_start_plus_window() {
        let notary = Keypair::generate().public_key();
        let header = builder(Ok(100))
            .build(NetworkId::STOKENET, &notary)
            .await
            .unwrap();
        assert_eq!(header.start_epoch_inclusive, Epoch(100));
        assert_eq!(header.end_epoch_exclusive, Epoch(110));
        assert_eq!(header.notary_public_key, notary);
        assert_eq!(header.version, TRANSACTION_VERSION);
        assert_eq!(header.cost_unit_limit, COST_UNIT_LIMIT);
        assert_eq!(header.tip_percentage, 0);
        assert!(!header.notary_is_signatory);
    }

    #[tokio::test]
    async fn epoch_failure_maps_to_get_epoch() {
        let notary = Keypair::generate().public_key();
        let err = builder(Err(()))
            .build(NetworkId::STOKENET, &notary)
            .await
            .unwrap_err();
        assert!(matches!(err, TransactionApprovalFailure::GetEpoch { .. }));
    }

    #[tokio::test]
    async fn epoch_overflow_maps_to_build_header() {
        let notary = Keypair::generate().public_key();
        let err = builder(Ok(u64::MAX - 3))
            .build(NetworkId::STOKENET, &notary)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionApprovalFailure::BuildTransactionHeader { .. }
        ));
    }

    #[tokio::test]
    async fn nonces_are_fresh_per_build() {
        let notary = Keypair::generate().public_key();
        let b = builder(Ok(1));
        let first = b.build(NetworkId::STOKENET, &notary).await.unwrap();
        let second = b.build(NetworkId::STOKENET, &notary).await.unwrap();
        assert_ne!(first.nonce, second.nonce);
    }

    #[tokio::test]
    async fn seeded_source_is_reproducible() {
        let notary = Keypair::generate().public_key();
        let seeded = |seed| {
            builder(Ok(1)).with_nonce_source(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
        };
        let a = seeded(7).build(NetworkId::STOKENET, &notary).await.unwrap();
        let b = seeded(7).build(NetworkId::STOKENET, &notary).await.unwrap();
        assert_eq!(a.nonce, b.nonce);

        let mut rng = StdRng::seed_from_u64(7);
        let mut bytes = [0u8; NONCE_LENGTH];
        rng.fill_bytes(&mut bytes);
        assert_eq!(a.nonce, u64::from_le_bytes(bytes));
    }

    #[test]
    fn pretty_string_lists_fields() {
        let header = TransactionHeader {
            version: 1,
            network_id: NetworkId::STOKENET,
            start_epoch_inclusive: Epoch(5),
            end_epoch_exclusive: Epoch(15),
            nonce: 42,
            notary_public_key: Keypair::from_seed(&[1u8; 32]).public_key(),
            notary_is_signatory: false,
            cost_unit_limit: COST_UNIT_LIMIT,
            tip_percentage: 0,
        };
        let text = header.to_pretty_string();
        assert!(text.contains("[Start Epoch]         => 5\n"));
        assert!(text.contains("[End Epoch]           => 15\n"));
        assert!(text.contains("[Nonce]               => 42\n"));
    }
}
