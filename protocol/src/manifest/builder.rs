//! # Manifest Builder
//!
//! A consuming, chainable builder for structured manifests:
//!
//! ```
//! use quill_protocol::crypto::keys::Keypair;
//! use quill_protocol::manifest::address::Address;
//! use quill_protocol::manifest::decimal::Decimal;
//! use quill_protocol::manifest::ManifestBuilder;
//! use quill_protocol::network::{known_addresses, NetworkId};
//!
//! let network = NetworkId::STOKENET;
//! let xrd = known_addresses(network).native_token;
//! let alice = Address::virtual_account(&Keypair::generate().public_key(), network);
//! let bob = Address::virtual_account(&Keypair::generate().public_key(), network);
//!
//! let mut builder = ManifestBuilder::new();
//! let bucket = builder.new_bucket();
//! let manifest = builder
//!     .withdraw(alice, xrd, Decimal::from(5u64))
//!     .take_from_worktop(xrd, Decimal::from(5u64), &bucket)
//!     .try_deposit_or_abort(bob, &bucket)
//!     .build(network)
//!     .unwrap();
//! assert_eq!(manifest.structured().unwrap().len(), 3);
//! ```
//!
//! Nothing is checked until [`ManifestBuilder::build`], which consumes the
//! builder. A builder cannot be reused after that.

use super::address::Address;
use super::decimal::Decimal;
use super::instruction::{AccountMethod, Instruction};
use super::value::{
    BlobRef, Bucket, Expression, ManifestValue, NonFungibleGlobalId, NonFungibleLocalId,
};
use super::{ManifestError, TransactionManifest};
use crate::crypto::keys::PublicKeyHash;
use crate::error::TransactionApprovalFailure;
use crate::network::NetworkId;

/// Metadata key under which an entity's owner key hashes are stored.
pub const OWNER_KEYS_METADATA_KEY: &str = "owner_keys";

/// What an account does with deposits from third parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositRule {
    Accept,
    Reject,
    AllowExisting,
}

impl DepositRule {
    fn discriminator(self) -> u8 {
        match self {
            DepositRule::Accept => 0,
            DepositRule::Reject => 1,
            DepositRule::AllowExisting => 2,
        }
    }
}

/// Per-resource exception to the default deposit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePreference {
    Allowed,
    Disallowed,
}

impl ResourcePreference {
    fn discriminator(self) -> u8 {
        match self {
            ResourcePreference::Allowed => 0,
            ResourcePreference::Disallowed => 1,
        }
    }
}

/// A badge that may be presented to deposit into an account regardless of
/// its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrNonFungible {
    NonFungible(NonFungibleGlobalId),
    Resource(Address),
}

impl From<ResourceOrNonFungible> for ManifestValue {
    fn from(badge: ResourceOrNonFungible) -> Self {
        match badge {
            ResourceOrNonFungible::NonFungible(id) => ManifestValue::Enum {
                discriminator: 0,
                fields: vec![ManifestValue::Tuple(vec![
                    ManifestValue::Address(id.resource),
                    ManifestValue::NonFungibleLocalId(id.local_id),
                ])],
            },
            ResourceOrNonFungible::Resource(address) => ManifestValue::Enum {
                discriminator: 1,
                fields: vec![ManifestValue::Address(address)],
            },
        }
    }
}

/// `Option::None` as the ledger encodes it.
fn none() -> ManifestValue {
    ManifestValue::unit_enum(0)
}

// ---------------------------------------------------------------------------
// ManifestBuilder
// ---------------------------------------------------------------------------

/// Accumulates instructions and blobs for one manifest.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    instructions: Vec<Instruction>,
    blobs: Vec<Vec<u8>>,
    next_bucket: u32,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bucket name no other bucket of this build uses.
    pub fn new_bucket(&mut self) -> Bucket {
        let bucket = Bucket(format!("bucket{}", self.next_bucket));
        self.next_bucket += 1;
        bucket
    }

    /// Attach a blob and get a reference to pass as an argument.
    pub fn add_blob(&mut self, blob: Vec<u8>) -> BlobRef {
        let blob_ref = BlobRef::of(&blob);
        self.blobs.push(blob);
        blob_ref
    }

    /// Append an arbitrary instruction.
    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    fn account_call(
        self,
        account: Address,
        method: AccountMethod,
        args: Vec<ManifestValue>,
    ) -> Self {
        self.instruction(Instruction::call_account(account, method, args))
    }

    // -- fees -------------------------------------------------------------

    /// Lock `amount` of the account's native token to pay fees.
    pub fn lock_fee(self, account: Address, amount: Decimal) -> Self {
        self.account_call(account, AccountMethod::LockFee, vec![amount.into()])
    }

    /// Lock fees from the test-network faucet instead of an account.
    pub fn faucet_lock_fee(self, faucet: Address, amount: Decimal) -> Self {
        self.call_method(faucet, "lock_fee", vec![amount.into()])
    }

    /// Ask the faucet for free test tokens. They land on the worktop.
    pub fn faucet_free(self, faucet: Address) -> Self {
        self.call_method(faucet, "free", vec![])
    }

    // -- withdrawals ------------------------------------------------------

    pub fn withdraw(self, account: Address, resource: Address, amount: Decimal) -> Self {
        self.account_call(
            account,
            AccountMethod::Withdraw,
            vec![resource.into(), amount.into()],
        )
    }

    pub fn withdraw_non_fungibles(
        self,
        account: Address,
        resource: Address,
        ids: Vec<NonFungibleLocalId>,
    ) -> Self {
        let ids = ids.into_iter().map(ManifestValue::from).collect();
        self.account_call(
            account,
            AccountMethod::WithdrawNonFungibles,
            vec![resource.into(), ManifestValue::Array(ids)],
        )
    }

    // -- worktop ----------------------------------------------------------

    pub fn take_from_worktop(self, resource: Address, amount: Decimal, into: &Bucket) -> Self {
        self.instruction(Instruction::TakeFromWorktop {
            resource,
            amount,
            new_bucket: into.clone(),
        })
    }

    pub fn take_non_fungibles_from_worktop(
        self,
        resource: Address,
        ids: Vec<NonFungibleLocalId>,
        into: &Bucket,
    ) -> Self {
        self.instruction(Instruction::TakeNonFungiblesFromWorktop {
            resource,
            ids,
            new_bucket: into.clone(),
        })
    }

    pub fn take_all_from_worktop(self, resource: Address, into: &Bucket) -> Self {
        self.instruction(Instruction::TakeAllFromWorktop {
            resource,
            new_bucket: into.clone(),
        })
    }

    pub fn assert_worktop_contains(self, resource: Address, amount: Decimal) -> Self {
        self.instruction(Instruction::AssertWorktopContains { resource, amount })
    }

    // -- deposits ---------------------------------------------------------

    /// Owner deposit. Needs the receiving account's signature.
    pub fn deposit(self, account: Address, bucket: &Bucket) -> Self {
        self.account_call(account, AccountMethod::Deposit, vec![bucket.clone().into()])
    }

    /// Third-party deposit, subject to the receiving account's rules.
    pub fn try_deposit_or_abort(self, account: Address, bucket: &Bucket) -> Self {
        self.account_call(
            account,
            AccountMethod::TryDepositOrAbort,
            vec![bucket.clone().into(), none()],
        )
    }

    /// Deposit whatever is left on the worktop.
    pub fn try_deposit_entire_worktop_or_abort(self, account: Address) -> Self {
        self.account_call(
            account,
            AccountMethod::TryDepositBatchOrAbort,
            vec![ManifestValue::Expression(Expression::EntireWorktop), none()],
        )
    }

    // -- metadata ---------------------------------------------------------

    pub fn set_metadata(
        self,
        address: Address,
        key: impl Into<String>,
        value: ManifestValue,
    ) -> Self {
        self.instruction(Instruction::MetadataSet {
            address,
            key: key.into(),
            value,
        })
    }

    /// Replace the owner keys of an account or identity.
    pub fn set_owner_keys(self, address: Address, key_hashes: Vec<PublicKeyHash>) -> Self {
        let hashes = key_hashes
            .into_iter()
            .map(ManifestValue::PublicKeyHash)
            .collect();
        self.set_metadata(address, OWNER_KEYS_METADATA_KEY, ManifestValue::Array(hashes))
    }

    // -- third-party deposit settings -------------------------------------

    pub fn set_default_deposit_rule(self, account: Address, rule: DepositRule) -> Self {
        self.account_call(
            account,
            AccountMethod::SetDefaultDepositRule,
            vec![ManifestValue::unit_enum(rule.discriminator())],
        )
    }

    pub fn set_resource_preference(
        self,
        account: Address,
        resource: Address,
        preference: ResourcePreference,
    ) -> Self {
        self.account_call(
            account,
            AccountMethod::SetResourcePreference,
            vec![
                resource.into(),
                ManifestValue::unit_enum(preference.discriminator()),
            ],
        )
    }

    pub fn remove_resource_preference(self, account: Address, resource: Address) -> Self {
        self.account_call(
            account,
            AccountMethod::RemoveResourcePreference,
            vec![resource.into()],
        )
    }

    pub fn add_authorized_depositor(self, account: Address, badge: ResourceOrNonFungible) -> Self {
        self.account_call(account, AccountMethod::AddAuthorizedDepositor, vec![badge.into()])
    }

    pub fn remove_authorized_depositor(
        self,
        account: Address,
        badge: ResourceOrNonFungible,
    ) -> Self {
        self.account_call(
            account,
            AccountMethod::RemoveAuthorizedDepositor,
            vec![badge.into()],
        )
    }

    // -- raw calls --------------------------------------------------------

    pub fn call_method(
        self,
        address: Address,
        method: impl Into<String>,
        args: Vec<ManifestValue>,
    ) -> Self {
        self.instruction(Instruction::CallMethod {
            address,
            method: method.into(),
            args,
        })
    }

    pub fn call_function(
        self,
        package: Address,
        blueprint: impl Into<String>,
        function: impl Into<String>,
        args: Vec<ManifestValue>,
    ) -> Self {
        self.instruction(Instruction::CallFunction {
            package,
            blueprint: blueprint.into(),
            function: function.into(),
            args,
        })
    }

    // -- finish -----------------------------------------------------------

    /// Finish the manifest for `network`. Every address must live on
    /// `network`, and every bucket must be filled once and consumed once.
    pub fn build(self, network: NetworkId) -> Result<TransactionManifest, ManifestError> {
        TransactionManifest::new(network, self.instructions, self.blobs)
    }

    /// [`ManifestBuilder::build`], with failures reported as the pipeline's
    /// manifest-conversion failure.
    pub fn build_safely(
        self,
        network: NetworkId,
    ) -> Result<TransactionManifest, TransactionApprovalFailure> {
        self.build(network)
            .map_err(|e| TransactionApprovalFailure::ConvertManifest {
                reason: e.to_string(),
            })
    }
}
