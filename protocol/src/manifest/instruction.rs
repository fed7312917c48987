//! Manifest instructions and the account methods they call.

use serde::{Deserialize, Serialize};

use super::address::Address;
use super::decimal::Decimal;
use super::value::{Bucket, ManifestValue, NonFungibleLocalId};

/// One step of a transaction manifest.
///
/// Withdrawals and deposits are account method calls, so they appear as
/// [`Instruction::CallMethod`] with the matching [`AccountMethod`] name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    TakeFromWorktop {
        resource: Address,
        amount: Decimal,
        new_bucket: Bucket,
    },
    TakeNonFungiblesFromWorktop {
        resource: Address,
        ids: Vec<NonFungibleLocalId>,
        new_bucket: Bucket,
    },
    TakeAllFromWorktop {
        resource: Address,
        new_bucket: Bucket,
    },
    AssertWorktopContains {
        resource: Address,
        amount: Decimal,
    },
    CallFunction {
        package: Address,
        blueprint: String,
        function: String,
        args: Vec<ManifestValue>,
    },
    CallMethod {
        address: Address,
        method: String,
        args: Vec<ManifestValue>,
    },
    /// Set a metadata entry on an entity. Goes through the entity's
    /// metadata module, which is owner-protected.
    MetadataSet {
        address: Address,
        key: String,
        value: ManifestValue,
    },
}

impl Instruction {
    /// Shorthand for an account method call.
    pub fn call_account(address: Address, method: AccountMethod, args: Vec<ManifestValue>) -> Self {
        Instruction::CallMethod {
            address,
            method: method.name().to_string(),
            args,
        }
    }

    /// The bucket this instruction creates, if any.
    pub fn new_bucket(&self) -> Option<&Bucket> {
        match self {
            Instruction::TakeFromWorktop { new_bucket, .. }
            | Instruction::TakeNonFungiblesFromWorktop { new_bucket, .. }
            | Instruction::TakeAllFromWorktop { new_bucket, .. } => Some(new_bucket),
            Instruction::AssertWorktopContains { .. }
            | Instruction::CallFunction { .. }
            | Instruction::CallMethod { .. }
            | Instruction::MetadataSet { .. } => None,
        }
    }

    /// Buckets consumed by this instruction's arguments.
    pub fn consumed_buckets(&self) -> Vec<&Bucket> {
        let mut out = Vec::new();
        match self {
            Instruction::CallFunction { args, .. } | Instruction::CallMethod { args, .. } => {
                args.iter().for_each(|a| a.visit_buckets(&mut |b| out.push(b)));
            }
            Instruction::MetadataSet { value, .. } => value.visit_buckets(&mut |b| out.push(b)),
            Instruction::TakeFromWorktop { .. }
            | Instruction::TakeNonFungiblesFromWorktop { .. }
            | Instruction::TakeAllFromWorktop { .. }
            | Instruction::AssertWorktopContains { .. } => {}
        }
        out
    }

    /// Every address referenced by this instruction, receivers included.
    pub fn addresses(&self) -> Vec<&Address> {
        let mut out = Vec::new();
        match self {
            Instruction::TakeFromWorktop { resource, .. }
            | Instruction::TakeNonFungiblesFromWorktop { resource, .. }
            | Instruction::TakeAllFromWorktop { resource, .. }
            | Instruction::AssertWorktopContains { resource, .. } => out.push(resource),
            Instruction::CallFunction { package, args, .. } => {
                out.push(package);
                args.iter().for_each(|a| a.visit_addresses(&mut |x| out.push(x)));
            }
            Instruction::CallMethod { address, args, .. } => {
                out.push(address);
                args.iter().for_each(|a| a.visit_addresses(&mut |x| out.push(x)));
            }
            Instruction::MetadataSet { address, value, .. } => {
                out.push(address);
                value.visit_addresses(&mut |x| out.push(x));
            }
        }
        out
    }

    /// The entity whose owner must sign for this instruction, if any.
    ///
    /// Only account methods in the auth-protected set count. Metadata
    /// writes are not method calls and are never inspected here; callers
    /// that need the entity's signature name it explicitly.
    pub fn auth_target(&self) -> Option<&Address> {
        match self {
            Instruction::CallMethod {
                address, method, ..
            } if address.is_account() => AccountMethod::from_name(method)
                .filter(|m| m.requires_auth())
                .map(|_| address),
            Instruction::CallMethod { .. }
            | Instruction::MetadataSet { .. }
            | Instruction::CallFunction { .. }
            | Instruction::TakeFromWorktop { .. }
            | Instruction::TakeNonFungiblesFromWorktop { .. }
            | Instruction::TakeAllFromWorktop { .. }
            | Instruction::AssertWorktopContains { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AccountMethod
// ---------------------------------------------------------------------------

/// Methods of the native account blueprint that the wallet calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountMethod {
    LockFee,
    LockContingentFee,
    Withdraw,
    WithdrawNonFungibles,
    LockFeeAndWithdraw,
    CreateProofOfAmount,
    CreateProofOfNonFungibles,
    Deposit,
    DepositBatch,
    TryDepositOrAbort,
    TryDepositBatchOrAbort,
    TryDepositOrRefund,
    SetDefaultDepositRule,
    SetResourcePreference,
    RemoveResourcePreference,
    AddAuthorizedDepositor,
    RemoveAuthorizedDepositor,
    Burn,
    Securify,
}

impl AccountMethod {
    pub const ALL: [AccountMethod; 19] = [
        AccountMethod::LockFee,
        AccountMethod::LockContingentFee,
        AccountMethod::Withdraw,
        AccountMethod::WithdrawNonFungibles,
        AccountMethod::LockFeeAndWithdraw,
        AccountMethod::CreateProofOfAmount,
        AccountMethod::CreateProofOfNonFungibles,
        AccountMethod::Deposit,
        AccountMethod::DepositBatch,
        AccountMethod::TryDepositOrAbort,
        AccountMethod::TryDepositBatchOrAbort,
        AccountMethod::TryDepositOrRefund,
        AccountMethod::SetDefaultDepositRule,
        AccountMethod::SetResourcePreference,
        AccountMethod::RemoveResourcePreference,
        AccountMethod::AddAuthorizedDepositor,
        AccountMethod::RemoveAuthorizedDepositor,
        AccountMethod::Burn,
        AccountMethod::Securify,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccountMethod::LockFee => "lock_fee",
            AccountMethod::LockContingentFee => "lock_contingent_fee",
            AccountMethod::Withdraw => "withdraw",
            AccountMethod::WithdrawNonFungibles => "withdraw_non_fungibles",
            AccountMethod::LockFeeAndWithdraw => "lock_fee_and_withdraw",
            AccountMethod::CreateProofOfAmount => "create_proof_of_amount",
            AccountMethod::CreateProofOfNonFungibles => "create_proof_of_non_fungibles",
            AccountMethod::Deposit => "deposit",
            AccountMethod::DepositBatch => "deposit_batch",
            AccountMethod::TryDepositOrAbort => "try_deposit_or_abort",
            AccountMethod::TryDepositBatchOrAbort => "try_deposit_batch_or_abort",
            AccountMethod::TryDepositOrRefund => "try_deposit_or_refund",
            AccountMethod::SetDefaultDepositRule => "set_default_deposit_rule",
            AccountMethod::SetResourcePreference => "set_resource_preference",
            AccountMethod::RemoveResourcePreference => "remove_resource_preference",
            AccountMethod::AddAuthorizedDepositor => "add_authorized_depositor",
            AccountMethod::RemoveAuthorizedDepositor => "remove_authorized_depositor",
            AccountMethod::Burn => "burn",
            AccountMethod::Securify => "securify",
        }
    }

    pub fn from_name(name: &str) -> Option<AccountMethod> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Whether calling this method needs the account owner's signature.
    /// The `try_deposit_*` family is callable by anyone; the account's
    /// deposit rules decide the outcome.
    pub fn requires_auth(self) -> bool {
        match self {
            AccountMethod::LockFee
            | AccountMethod::LockContingentFee
            | AccountMethod::Withdraw
            | AccountMethod::WithdrawNonFungibles
            | AccountMethod::LockFeeAndWithdraw
            | AccountMethod::CreateProofOfAmount
            | AccountMethod::CreateProofOfNonFungibles
            | AccountMethod::Deposit
            | AccountMethod::DepositBatch
            | AccountMethod::SetDefaultDepositRule
            | AccountMethod::SetResourcePreference
            | AccountMethod::RemoveResourcePreference
            | AccountMethod::AddAuthorizedDepositor
            | AccountMethod::RemoveAuthorizedDepositor
            | AccountMethod::Burn
            | AccountMethod::Securify => true,
            AccountMethod::TryDepositOrAbort
            | AccountMethod::TryDepositBatchOrAbort
            | AccountMethod::TryDepositOrRefund => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use crate::network::{known_addresses, NetworkId};

    fn account() -> Address {
        Address::virtual_account(&Keypair::from_seed(&[9u8; 32]).public_key(), NetworkId::STOKENET)
    }

    #[test]
    fn method_names_roundtrip() {
        for m in AccountMethod::ALL {
            assert_eq!(AccountMethod::from_name(m.name()), Some(m));
        }
        assert_eq!(AccountMethod::from_name("free"), None);
    }

    #[test]
    fn withdraw_needs_auth_try_deposit_does_not() {
        let withdraw = Instruction::call_account(account(), AccountMethod::Withdraw, vec![]);
        assert_eq!(withdraw.auth_target(), Some(&account()));

        let deposit =
            Instruction::call_account(account(), AccountMethod::TryDepositOrAbort, vec![]);
        assert_eq!(deposit.auth_target(), None);
    }

    #[test]
    fn auth_methods_on_components_are_ignored() {
        let faucet = known_addresses(NetworkId::STOKENET).faucet;
        let call = Instruction::CallMethod {
            address: faucet,
            method: "lock_fee".into(),
            args: vec![],
        };
        assert_eq!(call.auth_target(), None);
    }

    #[test]
    fn metadata_set_is_not_an_auth_call() {
        let set = Instruction::MetadataSet {
            address: account(),
            key: "owner_keys".into(),
            value: ManifestValue::Array(vec![]),
        };
        assert_eq!(set.auth_target(), None);
    }

    #[test]
    fn bucket_bookkeeping() {
        let resource = known_addresses(NetworkId::STOKENET).native_token;
        let take = Instruction::TakeAllFromWorktop {
            resource,
            new_bucket: Bucket("bucket1".into()),
        };
        assert_eq!(take.new_bucket(), Some(&Bucket("bucket1".into())));

        let deposit = Instruction::call_account(
            account(),
            AccountMethod::Deposit,
            vec![Bucket("bucket1".into()).into()],
        );
        assert_eq!(deposit.consumed_buckets(), vec![&Bucket("bucket1".into())]);
        assert_eq!(deposit.addresses(), vec![&account()]);
    }
}
