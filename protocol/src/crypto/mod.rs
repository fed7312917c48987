//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited implementations: Ed25519 for
//! signer and notary signatures, SHA-256 for transaction identifiers,
//! BLAKE3 for wallet-side derivations. Nothing in here rolls its own.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, double_sha256, sha256};
pub use keys::{Keypair, PublicKey, PublicKeyHash, Signature, SignatureWithPublicKey};
