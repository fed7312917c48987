//! Binary framing for compiled payloads.
//!
//! ```text
//! ┌──────────┬──────┬────────────────────┐
//! │ 0x4d     │ kind │ bincode(body)      │
//! └──────────┴──────┴────────────────────┘
//! ```
//!
//! The kind byte keeps an intent from ever being mistaken for a notarized
//! transaction, so a signature over one can never be replayed as the other.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::PAYLOAD_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("payload too short")]
    Truncated,

    #[error("unexpected payload prefix {0:#04x}")]
    BadPrefix(u8),

    #[error("expected a {expected:?} payload, found kind byte {found}")]
    WrongKind { expected: PayloadKind, found: u8 },

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// What a compiled payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Intent = 1,
    SignedIntent = 2,
    NotarizedTransaction = 3,
}

/// Frame and serialize `body` as a payload of `kind`.
pub fn encode<T: Serialize>(kind: PayloadKind, body: &T) -> Result<Vec<u8>, CodecError> {
    let encoded = bincode::serialize(body).map_err(|e| CodecError::Encode(e.to_string()))?;
    let mut out = Vec::with_capacity(encoded.len() + 2);
    out.push(PAYLOAD_PREFIX);
    out.push(kind as u8);
    out.extend_from_slice(&encoded);
    Ok(out)
}

/// Check the frame and deserialize a payload of `kind`. The whole buffer
/// must be consumed.
pub fn decode<T: DeserializeOwned>(kind: PayloadKind, bytes: &[u8]) -> Result<T, CodecError> {
    let [prefix, found, body @ ..] = bytes else {
        return Err(CodecError::Truncated);
    };
    if *prefix != PAYLOAD_PREFIX {
        return Err(CodecError::BadPrefix(*prefix));
    }
    if *found != kind as u8 {
        return Err(CodecError::WrongKind {
            expected: kind,
            found: *found,
        });
    }

    let mut cursor = body;
    let value = bincode::deserialize_from(&mut cursor)
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    if !cursor.is_empty() {
        return Err(CodecError::TrailingBytes(cursor.len()));
    }
    Ok(value)
}
