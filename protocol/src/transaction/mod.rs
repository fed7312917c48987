//! # Transaction Module
//!
//! Turns a manifest into submittable bytes.
//!
//! ## Architecture
//!
//! ```text
//! signers.rs — Which accounts must sign, who pays the fee, who notarizes
//! fee.rs     — Prepends the lock_fee instruction
//! header.rs  — Epoch window, nonce and notary key
//! intent.rs  — Compile, sign, notarize; transaction ids
//! codec.rs   — Framed bincode encoding of compiled payloads
//! ```
//!
//! ## Pipeline
//!
//! 1. **Fee payer** — [`select_fee_payer`] picks the account that locks the fee.
//! 2. **Fee lock** — [`inject_lock_fee`] puts `lock_fee` at instruction 0.
//! 3. **Signers** — [`NotaryAndSigners::resolve`] on the fee-locked manifest.
//! 4. **Header** — [`HeaderBuilder::build`] against the live epoch.
//! 5. **Compile & sign** — [`TransactionIntent::compile`], then [`sign`].
//! 6. **Notarize** — [`notarize`] yields the bytes the gateway accepts.
//!
//! Every step fails with its own [`TransactionApprovalFailure`] variant.
//!
//! [`TransactionApprovalFailure`]: crate::error::TransactionApprovalFailure

pub mod codec;
pub mod fee;
pub mod header;
pub mod intent;
pub mod signers;

pub use fee::inject_lock_fee;
pub use header::{Epoch, HeaderBuilder, NonceSource, OsNonceSource, TransactionHeader};
pub use intent::{
    notarize, sign, transaction_id, CompiledIntent, CompiledNotarizedIntent, NotarizedTransaction,
    SignedIntent, TransactionId, TransactionIntent, TransactionMessage,
};
pub use signers::{addresses_requiring_auth, select_fee_payer, NotaryAndSigners};
