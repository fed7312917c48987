//! Fee-lock injection.
//!
//! The ledger reserves fees with whatever lock runs first, so the lock is
//! always prepended, never appended.

use tracing::{debug, warn};

use crate::manifest::address::Address;
use crate::manifest::decimal::Decimal;
use crate::manifest::instruction::{AccountMethod, Instruction};
use crate::manifest::TransactionManifest;

/// The `lock_fee` call injected for `payer`.
pub fn lock_fee_instruction(payer: Address, amount: Decimal) -> Instruction {
    Instruction::call_account(payer, AccountMethod::LockFee, vec![amount.into()])
}

/// Return a copy of `manifest` with a `lock_fee` call on `payer` as its
/// first instruction.
///
/// Opaque manifests cannot be amended and come back unchanged.
pub fn inject_lock_fee(
    manifest: &TransactionManifest,
    payer: Address,
    amount: Decimal,
) -> TransactionManifest {
    match manifest.with_instruction_at(0, lock_fee_instruction(payer, amount)) {
        Ok(with_fee) => {
            debug!(payer = %payer, amount = %amount, "lock fee injected");
            with_fee
        }
        Err(e) => {
            warn!(error = %e, "lock fee not injected; manifest left unchanged");
            manifest.clone()
        }
    }
}
