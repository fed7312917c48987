//! Typed instruction arguments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::address::Address;
use super::decimal::Decimal;
use super::ManifestError;
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::PublicKeyHash;

/// A named handle for resources sitting in a bucket during one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bucket(pub String);

impl Bucket {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket(\"{}\")", self.0)
    }
}

/// Manifest expressions. Only one is needed by a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    EntireWorktop,
}

/// Reference to a blob attached to the manifest, by content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef(pub [u8; 32]);

impl BlobRef {
    pub fn of(blob: &[u8]) -> Self {
        BlobRef(blake3_hash(blob))
    }
}

// ---------------------------------------------------------------------------
// NonFungibleLocalId
// ---------------------------------------------------------------------------

/// Local id of a non-fungible within its resource.
///
/// Textual forms: `#42#` integer, `<name>` string, `[c0ffee]` bytes,
/// `{xxxxxxxxxxxxxxxx-xxxxxxxxxxxxxxxx-xxxxxxxxxxxxxxxx-xxxxxxxxxxxxxxxx}` RUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NonFungibleLocalId {
    Integer(u64),
    String(String),
    Bytes(Vec<u8>),
    Ruid([u8; 32]),
}

impl FromStr for NonFungibleLocalId {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ManifestError::InvalidLocalId(s.to_string());
        let inner = |open: char, close: char| s.strip_prefix(open)?.strip_suffix(close);

        if let Some(n) = inner('#', '#') {
            return n.parse().map(Self::Integer).map_err(|_| invalid());
        }
        if let Some(name) = inner('<', '>') {
            let ok = !name.is_empty()
                && name.len() <= 64
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            return ok.then(|| Self::String(name.to_string())).ok_or_else(invalid);
        }
        if let Some(h) = inner('[', ']') {
            let bytes = hex::decode(h).map_err(|_| invalid())?;
            if bytes.is_empty() || bytes.len() > 64 {
                return Err(invalid());
            }
            return Ok(Self::Bytes(bytes));
        }
        if let Some(r) = inner('{', '}') {
            let parts: Vec<&str> = r.split('-').collect();
            if parts.len() != 4 || parts.iter().any(|p| p.len() != 16) {
                return Err(invalid());
            }
            let bytes = hex::decode(parts.concat()).map_err(|_| invalid())?;
            let mut ruid = [0u8; 32];
            ruid.copy_from_slice(&bytes);
            return Ok(Self::Ruid(ruid));
        }
        Err(invalid())
    }
}

impl fmt::Display for NonFungibleLocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "#{n}#"),
            Self::String(s) => write!(f, "<{s}>"),
            Self::Bytes(b) => write!(f, "[{}]", hex::encode(b)),
            Self::Ruid(r) => {
                let h = hex::encode(r);
                write!(f, "{{{}-{}-{}-{}}}", &h[..16], &h[16..32], &h[32..48], &h[48..])
            }
        }
    }
}

/// A single non-fungible: `resource_address:local_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonFungibleGlobalId {
    pub resource: Address,
    pub local_id: NonFungibleLocalId,
}

impl FromStr for NonFungibleGlobalId {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, local_id) = s
            .split_once(':')
            .ok_or_else(|| ManifestError::InvalidGlobalId(s.to_string()))?;
        Ok(Self {
            resource: resource.parse()?,
            local_id: local_id.parse()?,
        })
    }
}

impl fmt::Display for NonFungibleGlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.local_id)
    }
}

// ---------------------------------------------------------------------------
// ManifestValue
// ---------------------------------------------------------------------------

/// An argument to a manifest instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestValue {
    Bool(bool),
    U8(u8),
    U32(u32),
    U64(u64),
    String(String),
    Decimal(Decimal),
    Address(Address),
    Bucket(Bucket),
    Enum {
        discriminator: u8,
        fields: Vec<ManifestValue>,
    },
    Tuple(Vec<ManifestValue>),
    Array(Vec<ManifestValue>),
    NonFungibleLocalId(NonFungibleLocalId),
    Expression(Expression),
    Blob(BlobRef),
    PublicKeyHash(PublicKeyHash),
}

impl ManifestValue {
    /// Fieldless enum variant.
    pub fn unit_enum(discriminator: u8) -> Self {
        ManifestValue::Enum {
            discriminator,
            fields: Vec::new(),
        }
    }

    /// Call `f` on every address nested anywhere in this value.
    pub fn visit_addresses<'a>(&'a self, f: &mut impl FnMut(&'a Address)) {
        match self {
            ManifestValue::Address(a) => f(a),
            ManifestValue::Enum { fields: vs, .. }
            | ManifestValue::Tuple(vs)
            | ManifestValue::Array(vs) => vs.iter().for_each(|v| v.visit_addresses(f)),
            ManifestValue::Bool(_)
            | ManifestValue::U8(_)
            | ManifestValue::U32(_)
            | ManifestValue::U64(_)
            | ManifestValue::String(_)
            | ManifestValue::Decimal(_)
            | ManifestValue::Bucket(_)
            | ManifestValue::NonFungibleLocalId(_)
            | ManifestValue::Expression(_)
            | ManifestValue::Blob(_)
            | ManifestValue::PublicKeyHash(_) => {}
        }
    }

    /// Call `f` on every bucket nested anywhere in this value.
    pub fn visit_buckets<'a>(&'a self, f: &mut impl FnMut(&'a Bucket)) {
        match self {
            ManifestValue::Bucket(b) => f(b),
            ManifestValue::Enum { fields: vs, .. }
            | ManifestValue::Tuple(vs)
            | ManifestValue::Array(vs) => vs.iter().for_each(|v| v.visit_buckets(f)),
            ManifestValue::Bool(_)
            | ManifestValue::U8(_)
            | ManifestValue::U32(_)
            | ManifestValue::U64(_)
            | ManifestValue::String(_)
            | ManifestValue::Decimal(_)
            | ManifestValue::Address(_)
            | ManifestValue::NonFungibleLocalId(_)
            | ManifestValue::Expression(_)
            | ManifestValue::Blob(_)
            | ManifestValue::PublicKeyHash(_) => {}
        }
    }
}

impl From<Address> for ManifestValue {
    fn from(a: Address) -> Self {
        ManifestValue::Address(a)
    }
}

impl From<Decimal> for ManifestValue {
    fn from(d: Decimal) -> Self {
        ManifestValue::Decimal(d)
    }
}

impl From<Bucket> for ManifestValue {
    fn from(b: Bucket) -> Self {
        ManifestValue::Bucket(b)
    }
}

impl From<&str> for ManifestValue {
    fn from(s: &str) -> Self {
        ManifestValue::String(s.to_string())
    }
}

impl From<bool> for ManifestValue {
    fn from(b: bool) -> Self {
        ManifestValue::Bool(b)
    }
}

impl From<NonFungibleLocalId> for ManifestValue {
    fn from(id: NonFungibleLocalId) -> Self {
        ManifestValue::NonFungibleLocalId(id)
    }
}
