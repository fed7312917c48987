//! # Transaction Manifests
//!
//! A manifest is the "what" of a transaction: an ordered list of
//! instructions plus any binary blobs they reference, bound to one network.
//!
//! ```text
//! CALL_METHOD  account_..  "lock_fee"   Decimal("10")      <- always first
//! CALL_METHOD  account_..  "withdraw"   Address(xrd) Decimal("5")
//! TAKE_FROM_WORKTOP        Address(xrd) Decimal("5") Bucket("bucket0")
//! CALL_METHOD  account_..  "try_deposit_or_abort" Bucket("bucket0") Enum<0u8>()
//! ```
//!
//! Manifests come in two shapes. The structured shape is an instruction list
//! the wallet can inspect and amend. The opaque shape is pre-rendered text
//! handed over by someone else (typically a dApp); the wallet can neither
//! analyse nor modify it, only sign what it is given.
//!
//! Manifests are values: every amendment returns a new manifest and leaves
//! the original alone.

pub mod address;
pub mod builder;
pub mod decimal;
pub mod instruction;
pub mod poet;
pub mod render;
pub mod value;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::NetworkId;
use address::{Address, AddressError};
use decimal::{Decimal, DecimalError};
use instruction::Instruction;

pub use builder::ManifestBuilder;

/// Errors raised while building or amending a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("address {address} belongs to network {found}, manifest targets network {expected}")]
    WrongNetwork {
        address: String,
        expected: NetworkId,
        found: NetworkId,
    },

    #[error("bucket '{0}' is used before any instruction fills it")]
    UnknownBucket(String),

    #[error("bucket '{0}' is consumed more than once")]
    BucketAlreadyConsumed(String),

    #[error("bucket '{0}' is filled twice")]
    BucketRedefined(String),

    #[error("bucket '{0}' is never consumed")]
    DanglingBucket(String),

    #[error("invalid non-fungible local id '{0}'")]
    InvalidLocalId(String),

    #[error("invalid non-fungible global id '{0}'")]
    InvalidGlobalId(String),

    #[error("opaque manifests cannot be amended")]
    OpaqueManifest,

    #[error("instruction index {index} out of bounds for {len} instructions")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Decimal(#[from] DecimalError),
}

/// The instruction list of a manifest, in one of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestInstructions {
    Structured(Vec<Instruction>),
    Opaque(String),
}

/// A complete manifest, bound to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionManifest {
    network_id: NetworkId,
    instructions: ManifestInstructions,
    blobs: Vec<Vec<u8>>,
}

impl TransactionManifest {
    /// Wrap an instruction list after checking it is well formed for
    /// `network_id`. The builder goes through here.
    pub fn new(
        network_id: NetworkId,
        instructions: Vec<Instruction>,
        blobs: Vec<Vec<u8>>,
    ) -> Result<Self, ManifestError> {
        validate(network_id, &instructions)?;
        Ok(Self {
            network_id,
            instructions: ManifestInstructions::Structured(instructions),
            blobs,
        })
    }

    /// Wrap pre-rendered manifest text. Nothing is checked.
    pub fn opaque(network_id: NetworkId, text: impl Into<String>, blobs: Vec<Vec<u8>>) -> Self {
        Self {
            network_id,
            instructions: ManifestInstructions::Opaque(text.into()),
            blobs,
        }
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    pub fn instructions(&self) -> &ManifestInstructions {
        &self.instructions
    }

    /// The instruction list, or `None` for an opaque manifest.
    pub fn structured(&self) -> Option<&[Instruction]> {
        match &self.instructions {
            ManifestInstructions::Structured(list) => Some(list),
            ManifestInstructions::Opaque(_) => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.instructions, ManifestInstructions::Opaque(_))
    }

    pub fn blobs(&self) -> &[Vec<u8>] {
        &self.blobs
    }

    /// A copy of this manifest with `instruction` inserted at `index`.
    pub fn with_instruction_at(
        &self,
        index: usize,
        instruction: Instruction,
    ) -> Result<Self, ManifestError> {
        let list = self.structured().ok_or(ManifestError::OpaqueManifest)?;
        if index > list.len() {
            return Err(ManifestError::IndexOutOfBounds {
                index,
                len: list.len(),
            });
        }
        let mut instructions = Vec::with_capacity(list.len() + 1);
        instructions.extend_from_slice(&list[..index]);
        instructions.push(instruction);
        instructions.extend_from_slice(&list[index..]);
        Ok(Self {
            network_id: self.network_id,
            instructions: ManifestInstructions::Structured(instructions),
            blobs: self.blobs.clone(),
        })
    }

    /// Insert an `AssertWorktopContains` guarantee at `index`, so the
    /// transaction aborts unless at least `amount` of `resource` sits on the
    /// worktop at that point.
    pub fn with_guarantee(
        &self,
        index: usize,
        resource: Address,
        amount: Decimal,
    ) -> Result<Self, ManifestError> {
        check_network(self.network_id, &resource)?;
        self.with_instruction_at(index, Instruction::AssertWorktopContains { resource, amount })
    }
}

fn check_network(network_id: NetworkId, address: &Address) -> Result<(), ManifestError> {
    if address.network_id() == network_id {
        Ok(())
    } else {
        Err(ManifestError::WrongNetwork {
            address: address.to_string(),
            expected: network_id,
            found: address.network_id(),
        })
    }
}

/// Network and bucket discipline: every address on `network_id`, every
/// bucket filled once before use, consumed exactly once.
fn validate(network_id: NetworkId, instructions: &[Instruction]) -> Result<(), ManifestError> {
    use std::collections::BTreeMap;

    // bucket name -> consumed?
    let mut buckets: BTreeMap<&str, bool> = BTreeMap::new();

    for instruction in instructions {
        for address in instruction.addresses() {
            check_network(network_id, address)?;
        }
        for bucket in instruction.consumed_buckets() {
            match buckets.get_mut(bucket.name()) {
                None => return Err(ManifestError::UnknownBucket(bucket.0.clone())),
                Some(true) => return Err(ManifestError::BucketAlreadyConsumed(bucket.0.clone())),
                Some(consumed) => *consumed = true,
            }
        }
        if let Some(bucket) = instruction.new_bucket() {
            if buckets.insert(bucket.name(), false).is_some() {
                return Err(ManifestError::BucketRedefined(bucket.0.clone()));
            }
        }
    }

    match buckets.into_iter().find(|(_, consumed)| !consumed) {
        Some((name, _)) => Err(ManifestError::DanglingBucket(name.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use crate::network::known_addresses;
    use instruction::AccountMethod;
    use value::Bucket;

    fn account(network: NetworkId) -> Address {
        Address::virtual_account(&Keypair::from_seed(&[11u8; 32]).public_key(), network)
    }

    fn take(bucket: &str) -> Instruction {
        Instruction::TakeAllFromWorktop {
            resource: known_addresses(NetworkId::STOKENET).native_token,
            new_bucket: Bucket(bucket.into()),
        }
    }

    fn deposit(bucket: &str) -> Instruction {
        Instruction::call_account(
            account(NetworkId::STOKENET),
            AccountMethod::Deposit,
            vec![Bucket(bucket.into()).into()],
        )
    }

    #[test]
    fn well_formed_manifest_accepted() {
        let m = TransactionManifest::new(
            NetworkId::STOKENET,
            vec![take("bucket0"), deposit("bucket0")],
            vec![],
        )
        .unwrap();
        assert_eq!(m.structured().unwrap().len(), 2);
        assert!(!m.is_opaque());
    }

    #[test]
    fn foreign_address_rejected() {
        let err = TransactionManifest::new(
            NetworkId::MAINNET,
            vec![Instruction::call_account(
                account(NetworkId::STOKENET),
                AccountMethod::LockFee,
                vec![Decimal::from(10u64).into()],
            )],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::WrongNetwork {
                expected: NetworkId::MAINNET,
                found: NetworkId::STOKENET,
                ..
            }
        ));
    }

    #[test]
    fn bucket_rules() {
        let net = NetworkId::STOKENET;
        assert_eq!(
            TransactionManifest::new(net, vec![deposit("bucket0")], vec![]).unwrap_err(),
            ManifestError::UnknownBucket("bucket0".into())
        );
        assert_eq!(
            TransactionManifest::new(
                net,
                vec![take("bucket0"), deposit("bucket0"), deposit("bucket0")],
                vec![]
            )
            .unwrap_err(),
            ManifestError::BucketAlreadyConsumed("bucket0".into())
        );
        assert_eq!(
            TransactionManifest::new(net, vec![take("bucket0"), take("bucket0")], vec![])
                .unwrap_err(),
            ManifestError::BucketRedefined("bucket0".into())
        );
        assert_eq!(
            TransactionManifest::new(net, vec![take("bucket0")], vec![]).unwrap_err(),
            ManifestError::DanglingBucket("bucket0".into())
        );
    }

    #[test]
    fn guarantee_inserted_at_index() {
        let net = NetworkId::STOKENET;
        let original =
            TransactionManifest::new(net, vec![take("bucket0"), deposit("bucket0")], vec![])
                .unwrap();
        let xrd = known_addresses(net).native_token;
        let guarded = original
            .with_guarantee(1, xrd, Decimal::from(3u64))
            .unwrap();

        let list = guarded.structured().unwrap();
        assert_eq!(list.len(), 3);
        assert!(matches!(
            list[1],
            Instruction::AssertWorktopContains { resource, .. } if resource == xrd
        ));
        // Original untouched.
        assert_eq!(original.structured().unwrap().len(), 2);

        assert!(matches!(
            original.with_guarantee(5, xrd, Decimal::ONE),
            Err(ManifestError::IndexOutOfBounds { index: 5, len: 2 })
        ));
    }

    #[test]
    fn opaque_manifest_cannot_be_amended() {
        let m = TransactionManifest::opaque(NetworkId::STOKENET, "CALL_METHOD ...;", vec![]);
        assert!(m.is_opaque());
        assert!(m.structured().is_none());
        assert_eq!(
            m.with_guarantee(0, known_addresses(NetworkId::STOKENET).native_token, Decimal::ONE),
            Err(ManifestError::OpaqueManifest)
        );
    }
}
