//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **SHA-256**: what the ledger uses for transaction identifiers. Every
//!   intent hash and signed-intent hash is `SHA-256(SHA-256(bytes))`, and
//!   signatures are made over those 32-byte digests, never over the raw
//!   payload.
//!
//! - **BLAKE3**: wallet-side derivations that never leave the client's
//!   trust boundary: virtual account node ids and public key hashes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use quill_protocol::crypto::sha256;
///
/// let hash = sha256(b"quill");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// This is the transaction identifier construction.
///
/// # Example
///
/// ```
/// use quill_protocol::crypto::double_sha256;
///
/// let tx_id = double_sha256(b"compiled intent bytes");
/// assert_eq!(tx_id.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn double_sha256_is_hash_of_hash() {
        let single = sha256(b"quill");
        let double = double_sha256(b"quill");
        assert_ne!(single, double);
        assert_eq!(double, sha256(&single));
    }

    #[test]
    fn double_sha256_known_vector() {
        // Bitcoin's well-known double hash of "hello".
        let hash = double_sha256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn blake3_deterministic_and_case_sensitive() {
        assert_eq!(blake3_hash(b"quill"), blake3_hash(b"quill"));
        assert_ne!(blake3_hash(b"quill"), blake3_hash(b"Quill"));
    }
}
