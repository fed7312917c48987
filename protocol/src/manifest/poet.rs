//! # Manifest Templates
//!
//! Ready-made manifests for the things a wallet does all day: getting test
//! funds, sending tokens and NFTs, claiming stake, tweaking deposit rules,
//! rotating owner keys. Every template builds through [`ManifestBuilder`],
//! so the result obeys the same network and bucket checks, and reports
//! failures as manifest-conversion failures.
//!
//! None of these lock fees (the faucet aside, which pays for itself). The
//! transaction client injects the fee lock before signing.

use super::address::Address;
use super::builder::{DepositRule, ManifestBuilder, ResourceOrNonFungible, ResourcePreference};
use super::decimal::Decimal;
use super::value::{Bucket, NonFungibleGlobalId, NonFungibleLocalId};
use super::TransactionManifest;
use crate::config::FAUCET_LOCK_FEE;
use crate::crypto::keys::PublicKeyHash;
use crate::error::TransactionApprovalFailure;
use crate::network::known_addresses;

/// One fungible leg of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleTransfer {
    pub to: Address,
    pub resource: Address,
    pub amount: Decimal,
    /// The recipient is one of our own accounts and will sign, so an owner
    /// deposit is used instead of a third-party one.
    pub signature_required: bool,
}

/// One non-fungible leg of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFungibleTransfer {
    pub to: Address,
    pub id: NonFungibleGlobalId,
    pub signature_required: bool,
}

/// Stake claim against one validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// The validator's claim NFT resource.
    pub resource: Address,
    pub validator: Address,
    /// Claim NFTs to redeem and the native-token amount each is worth.
    pub nfts: Vec<(NonFungibleLocalId, Decimal)>,
}

/// Changes to an account's third-party deposit settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdPartyDepositSettings {
    pub account: Address,
    pub default_rule: Option<DepositRule>,
    pub remove_exceptions: Vec<Address>,
    pub add_exceptions: Vec<(Address, ResourcePreference)>,
    pub remove_depositors: Vec<ResourceOrNonFungible>,
    pub add_depositors: Vec<ResourceOrNonFungible>,
}

fn conversion_failure(reason: impl ToString) -> TransactionApprovalFailure {
    TransactionApprovalFailure::ConvertManifest {
        reason: reason.to_string(),
    }
}

/// Test-network faucet: the faucet locks the fee, hands out free funds, and
/// everything on the worktop goes to `to`.
pub fn faucet(to: Address) -> Result<TransactionManifest, TransactionApprovalFailure> {
    let network = to.network_id();
    let faucet = known_addresses(network).faucet;
    ManifestBuilder::new()
        .faucet_lock_fee(faucet, Decimal::from(FAUCET_LOCK_FEE))
        .faucet_free(faucet)
        .try_deposit_entire_worktop_or_abort(to)
        .build_safely(network)
}

/// Send fungibles and non-fungibles from one account to any number of
/// recipients.
///
/// Fungibles are withdrawn once per resource (the sum of every leg), then
/// split into one bucket per recipient. Non-fungibles are withdrawn one by
/// one.
pub fn transfer(
    from: Address,
    fungibles: &[FungibleTransfer],
    non_fungibles: &[NonFungibleTransfer],
) -> Result<TransactionManifest, TransactionApprovalFailure> {
    let mut builder = ManifestBuilder::new();

    // Resources in first-seen order, with their total.
    let mut withdrawals: Vec<(Address, Decimal)> = Vec::new();
    for leg in fungibles {
        match withdrawals.iter_mut().find(|(r, _)| *r == leg.resource) {
            Some((_, total)) => {
                *total = total
                    .checked_add(leg.amount)
                    .ok_or_else(|| conversion_failure("transfer total overflows"))?;
            }
            None => withdrawals.push((leg.resource, leg.amount)),
        }
    }

    for (resource, total) in withdrawals {
        builder = builder.withdraw(from, resource, total);
        for leg in fungibles.iter().filter(|leg| leg.resource == resource) {
            let bucket = builder.new_bucket();
            builder = builder.take_from_worktop(resource, leg.amount, &bucket);
            builder = deposit(builder, leg.to, &bucket, leg.signature_required);
        }
    }

    for leg in non_fungibles {
        let bucket = builder.new_bucket();
        let ids = vec![leg.id.local_id.clone()];
        builder = builder
            .withdraw_non_fungibles(from, leg.id.resource, ids.clone())
            .take_non_fungibles_from_worktop(leg.id.resource, ids, &bucket);
        builder = deposit(builder, leg.to, &bucket, leg.signature_required);
    }

    builder.build_safely(from.network_id())
}

fn deposit(
    builder: ManifestBuilder,
    to: Address,
    bucket: &Bucket,
    signature_required: bool,
) -> ManifestBuilder {
    if signature_required {
        builder.deposit(to, bucket)
    } else {
        builder.try_deposit_or_abort(to, bucket)
    }
}

/// Redeem unstaked claim NFTs and deposit the proceeds back into `from`.
pub fn claim(
    from: Address,
    claims: &[Claim],
) -> Result<TransactionManifest, TransactionApprovalFailure> {
    let network = from.network_id();
    let native_token = known_addresses(network).native_token;
    let mut builder = ManifestBuilder::new();

    for claim in claims {
        let claim_bucket = builder.new_bucket();
        let proceeds_bucket = builder.new_bucket();
        let total = Decimal::checked_sum(claim.nfts.iter().map(|(_, amount)| *amount))
            .map_err(conversion_failure)?;
        let ids = claim.nfts.iter().map(|(id, _)| id.clone()).collect();

        builder = builder
            .withdraw_non_fungibles(from, claim.resource, ids)
            .take_all_from_worktop(claim.resource, &claim_bucket)
            .call_method(claim.validator, "claim_xrd", vec![claim_bucket.into()])
            .take_from_worktop(native_token, total, &proceeds_bucket)
            .deposit(from, &proceeds_bucket);
    }

    builder.build_safely(network)
}

/// Apply third-party deposit setting changes. Removals go before additions
/// so that replacing an exception in one transaction works.
pub fn third_party_deposits(
    settings: &ThirdPartyDepositSettings,
) -> Result<TransactionManifest, TransactionApprovalFailure> {
    let account = settings.account;
    let mut builder = ManifestBuilder::new();

    if let Some(rule) = settings.default_rule {
        builder = builder.set_default_deposit_rule(account, rule);
    }
    for resource in &settings.remove_exceptions {
        builder = builder.remove_resource_preference(account, *resource);
    }
    for (resource, preference) in &settings.add_exceptions {
        builder = builder.set_resource_preference(account, *resource, *preference);
    }
    for badge in &settings.remove_depositors {
        builder = builder.remove_authorized_depositor(account, badge.clone());
    }
    for badge in &settings.add_depositors {
        builder = builder.add_authorized_depositor(account, badge.clone());
    }

    builder.build_safely(account.network_id())
}

/// Rotate the owner keys of an account or identity.
///
/// The metadata write does not make `entity` a signer on its own; submit
/// with `entity` in [`SubmitOptions::extra_signers`].
///
/// [`SubmitOptions::extra_signers`]: crate::client::SubmitOptions::extra_signers
pub fn set_owner_keys(
    entity: Address,
    key_hashes: Vec<PublicKeyHash>,
) -> Result<TransactionManifest, TransactionApprovalFailure> {
    ManifestBuilder::new()
        .set_owner_keys(entity, key_hashes)
        .build_safely(entity.network_id())
}
