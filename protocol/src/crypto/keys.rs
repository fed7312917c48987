//! # Key Management
//!
//! Ed25519 keys for transaction signers and notaries.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Fresh keys come from `OsRng`.
//! - Key bytes are never logged. `Debug` on [`Keypair`] prints the public
//!   half only.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::blake3_hash;

/// Length of a public key hash, as stored in owner-key metadata.
pub const PUBLIC_KEY_HASH_LENGTH: usize = 29;

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not valid hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// An Ed25519 keypair able to sign transaction intents.
///
/// `Keypair` does NOT implement `Serialize`/`Deserialize`. Exporting a
/// secret is done on purpose with [`Keypair::to_bytes`], never by accident.
///
/// # Examples
///
/// ```
/// use quill_protocol::crypto::keys::Keypair;
///
/// let kp = Keypair::generate();
/// let sig = kp.sign(b"intent hash");
/// assert!(kp.public_key().verify(b"intent hash", &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of a keypair. This is what goes into the transaction
/// header (notary) and next to every intent signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature. Always 64 bytes when produced by [`Keypair::sign`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

/// A signature bundled with the key that produced it, the shape the ledger
/// expects for intent signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureWithPublicKey {
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl SignatureWithPublicKey {
    /// Check the signature against `message`.
    pub fn verify(&self, message: &[u8]) -> bool {
        self.public_key.verify(message, &self.signature)
    }
}

/// Truncated hash of a public key, used where the ledger stores key
/// commitments instead of keys (owner-key metadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyHash([u8; PUBLIC_KEY_HASH_LENGTH]);

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic for a given key and message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Sign and attach the public key.
    pub fn sign_with_public_key(&self, message: &[u8]) -> SignatureWithPublicKey {
        SignatureWithPublicKey {
            public_key: self.public_key(),
            signature: self.sign(message),
        }
    }

    /// Exports the raw 32-byte secret key material. Handle with care.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Create a `PublicKey` from raw bytes without point validation.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Try to create a `PublicKey` from a byte slice, validating that the
    /// bytes are a usable Ed25519 point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(dalek_sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Commitment to this key: the last 29 bytes of its BLAKE3 hash.
    pub fn hash(&self) -> PublicKeyHash {
        let digest = blake3_hash(&self.bytes);
        let mut out = [0u8; PUBLIC_KEY_HASH_LENGTH];
        out.copy_from_slice(&digest[32 - PUBLIC_KEY_HASH_LENGTH..]);
        PublicKeyHash(out)
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl PublicKeyHash {
    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; 64] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }

    /// Returns the hex-encoded signature string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"intent hash");
        assert!(kp.public_key().verify(b"intent hash", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.public_key().verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn signature_with_public_key_verifies() {
        let kp = Keypair::generate();
        let swpk = kp.sign_with_public_key(b"hash");
        assert_eq!(swpk.public_key, kp.public_key());
        assert!(swpk.verify(b"hash"));
        assert!(!swpk.verify(b"other"));
    }

    #[test]
    fn hex_roundtrip() {
        let kp = Keypair::generate();
        let restored = Keypair::from_hex(&hex::encode(kp.to_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());

        let pk = PublicKey::from_hex(&kp.public_key().to_hex()).unwrap();
        assert_eq!(pk, kp.public_key());
    }

    #[test]
    fn invalid_secret_hex_rejected() {
        assert!(Keypair::from_hex("deadbeef").is_err());
        assert!(Keypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert!(PublicKey::try_from_slice(&[0u8; 16]).is_err());
    }

    #[test]
    fn deterministic_from_seed_and_signatures() {
        let kp1 = Keypair::from_seed(&[42u8; 32]);
        let kp2 = Keypair::from_seed(&[42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.sign(b"m"), kp2.sign(b"m"));
    }

    #[test]
    fn public_key_hash_is_stable_and_distinct() {
        let a = Keypair::from_seed(&[1u8; 32]).public_key();
        let b = Keypair::from_seed(&[2u8; 32]).public_key();
        assert_eq!(a.hash(), a.hash());
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash().as_bytes().len(), PUBLIC_KEY_HASH_LENGTH);
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sig = Keypair::generate().sign(b"test");
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Signature::from_hex("abcd").is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_seed(&[7u8; 32]);
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.to_bytes())));
    }
}
