//! # Intent Compiler & Notarizer
//!
//! ```text
//! header + manifest ──compile──► CompiledIntent ──double-SHA256──► TransactionId
//!                                      │
//!            each signer signs the id ─┘
//!                                      ▼
//!                                SignedIntent ──compile──► double-SHA256 ──► notary signs
//!                                                                  │
//!                                                                  ▼
//!                                                   NotarizedTransaction ──compile──► payload
//! ```
//!
//! Every stage that can fail reports its own failure, so a caller can tell
//! a broken manifest from a signer that said no.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::codec::{self, CodecError, PayloadKind};
use super::header::TransactionHeader;
use crate::crypto::hash::double_sha256;
use crate::crypto::keys::{Signature, SignatureWithPublicKey};
use crate::error::TransactionApprovalFailure;
use crate::manifest::TransactionManifest;
use crate::wallet::TransactionSigner;

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// Identifier of a transaction: `SHA-256(SHA-256(compiled intent))`.
///
/// Displays and serializes as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    /// The id of a compiled intent.
    pub fn of(compiled_intent: &[u8]) -> Self {
        TransactionId(double_sha256(compiled_intent))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        TransactionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s).map_err(|e| CodecError::Decode(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| {
                CodecError::Decode(format!(
                    "transaction id must be 32 bytes, got {}",
                    bytes.len()
                ))
            })?;
        Ok(TransactionId(arr))
    }
}

/// Hex id of compiled intent bytes.
pub fn transaction_id(compiled_intent: &[u8]) -> String {
    TransactionId::of(compiled_intent).to_hex()
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.to_hex())
    }
}

impl FromStr for TransactionId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Optional note attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionMessage {
    #[default]
    None,
    PlainText(String),
}

/// Header, manifest and message: everything the signers agree to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub header: TransactionHeader,
    pub manifest: TransactionManifest,
    pub message: TransactionMessage,
}

impl TransactionIntent {
    pub fn new(header: TransactionHeader, manifest: TransactionManifest) -> Self {
        Self {
            header,
            manifest,
            message: TransactionMessage::None,
        }
    }

    pub fn with_message(mut self, message: TransactionMessage) -> Self {
        self.message = message;
        self
    }

    /// Serialize deterministically. Same intent, same bytes.
    pub fn compile(&self) -> Result<CompiledIntent, TransactionApprovalFailure> {
        codec::encode(PayloadKind::Intent, self)
            .map(CompiledIntent)
            .map_err(|e| TransactionApprovalFailure::CompileTransactionIntent {
                reason: e.to_string(),
            })
    }
}

/// Header and manifest compiled to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledIntent(Vec<u8>);

impl CompiledIntent {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn transaction_id(&self) -> TransactionId {
        TransactionId::of(&self.0)
    }
}

/// Compile `header` and `manifest` into intent bytes.
pub fn compile(
    header: &TransactionHeader,
    manifest: &TransactionManifest,
) -> Result<CompiledIntent, TransactionApprovalFailure> {
    TransactionIntent::new(header.clone(), manifest.clone()).compile()
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// An intent with every account signature attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedIntent {
    pub intent: TransactionIntent,
    pub intent_signatures: Vec<SignatureWithPublicKey>,
}

impl SignedIntent {
    /// The hash the notary signs.
    pub fn signed_intent_hash(&self) -> Result<[u8; 32], CodecError> {
        let bytes = codec::encode(PayloadKind::SignedIntent, self)?;
        Ok(double_sha256(&bytes))
    }
}

/// Collect one signature over the transaction id from each signer, in
/// order.
pub fn sign(
    intent: TransactionIntent,
    compiled: &CompiledIntent,
    signers: &[Arc<dyn TransactionSigner>],
) -> Result<SignedIntent, TransactionApprovalFailure> {
    let tx_id = compiled.transaction_id();
    let mut intent_signatures = Vec::with_capacity(signers.len());
    for signer in signers {
        let signature = signer.sign(tx_id.as_bytes()).map_err(|e| {
            TransactionApprovalFailure::SignIntentWithAccountSigners {
                reason: format!("{}: {e}", signer.address()),
            }
        })?;
        intent_signatures.push(signature);
    }
    debug!(tx_id = %tx_id, signatures = intent_signatures.len(), "intent signed");
    Ok(SignedIntent {
        intent,
        intent_signatures,
    })
}

// ---------------------------------------------------------------------------
// Notarization
// ---------------------------------------------------------------------------

/// A signed intent plus the notary's signature: ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizedTransaction {
    pub signed_intent: SignedIntent,
    pub notary_signature: Signature,
}

/// The final submittable bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledNotarizedIntent(Vec<u8>);

impl CompiledNotarizedIntent {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex form, as the gateway wants it.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl NotarizedTransaction {
    pub fn compile(&self) -> Result<CompiledNotarizedIntent, CodecError> {
        codec::encode(PayloadKind::NotarizedTransaction, self).map(CompiledNotarizedIntent)
    }

    /// Decode submittable bytes back into their parts.
    pub fn decompile(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(PayloadKind::NotarizedTransaction, bytes)
    }

    /// Id of the contained intent.
    pub fn transaction_id(&self) -> Result<TransactionId, CodecError> {
        let compiled = codec::encode(PayloadKind::Intent, &self.signed_intent.intent)?;
        Ok(TransactionId::of(&compiled))
    }

    /// Check every intent signature against the id and the notary
    /// signature against the header's notary key.
    pub fn verify_signatures(&self) -> Result<bool, CodecError> {
        let tx_id = self.transaction_id()?;
        let intents_ok = self
            .signed_intent
            .intent_signatures
            .iter()
            .all(|s| s.verify(tx_id.as_bytes()));
        let signed_hash = self.signed_intent.signed_intent_hash()?;
        let notary_ok = self
            .signed_intent
            .intent
            .header
            .notary_public_key
            .verify(&signed_hash, &self.notary_signature);
        Ok(intents_ok && notary_ok)
    }
}

/// Add the notary's signature over the signed intent and compile the
/// result.
pub fn notarize(
    signed: SignedIntent,
    notary: &dyn TransactionSigner,
) -> Result<(NotarizedTransaction, CompiledNotarizedIntent), TransactionApprovalFailure> {
    let prepare_failure =
        |reason: String| TransactionApprovalFailure::PrepareNotarizedTransaction { reason };

    let signed_hash = signed
        .signed_intent_hash()
        .map_err(|e| prepare_failure(e.to_string()))?;
    let notary_signature = notary
        .sign(&signed_hash)
        .map_err(|e| prepare_failure(e.to_string()))?;
    if notary_signature.public_key != signed.intent.header.notary_public_key {
        return Err(prepare_failure(format!(
            "notary key {} does not match header notary {}",
            notary_signature.public_key, signed.intent.header.notary_public_key
        )));
    }

    let notarized = NotarizedTransaction {
        signed_intent: signed,
        notary_signature: notary_signature.signature,
    };
    let compiled = notarized.compile().map_err(|e| {
        TransactionApprovalFailure::CompileNotarizedTransactionIntent {
            reason: e.to_string(),
        }
    })?;
    Ok((notarized, compiled))
}
