//! # Entity Addresses
//!
//! An address is a 30-byte node id wrapped in Bech32m:
//!
//! ```text
//! node_id = entity_byte (1) || body (29)
//! address = Bech32m("{entity}_{network suffix}", node_id)
//!         = account_tdx_2_1...
//! ```
//!
//! The HRP tells you both what the entity is and which network it lives on,
//! and parsing checks both against the entity byte. Virtual accounts are
//! derived from a public key so the wallet can map an account straight back
//! to the key that controls it.

use bech32::{Bech32m, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::NODE_ID_LENGTH;
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::PublicKey;
use crate::network::NetworkId;

const BODY_LENGTH: usize = NODE_ID_LENGTH - 1;

/// Errors that can occur while parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    #[error("malformed HRP '{0}'")]
    MalformedHrp(String),

    #[error("unknown entity prefix '{0}'")]
    UnknownEntity(String),

    #[error("unknown network suffix '{0}'")]
    UnknownNetwork(String),

    #[error("entity byte {byte:#04x} does not match HRP entity '{hrp_entity}'")]
    EntityMismatch { byte: u8, hrp_entity: String },

    #[error("invalid node id length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("expected an {expected} address, got {got}")]
    WrongEntityType {
        expected: EntityType,
        got: EntityType,
    },
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// The kinds of global entity a manifest can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Account,
    Identity,
    Resource,
    Component,
    Package,
    Validator,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Account,
        EntityType::Identity,
        EntityType::Resource,
        EntityType::Component,
        EntityType::Package,
        EntityType::Validator,
    ];

    /// First byte of the node id.
    pub fn entity_byte(self) -> u8 {
        match self {
            EntityType::Account => 0x51,
            EntityType::Identity => 0x52,
            EntityType::Resource => 0x5d,
            EntityType::Component => 0xc0,
            EntityType::Package => 0x0d,
            EntityType::Validator => 0x83,
        }
    }

    /// HRP prefix, the part before the network suffix.
    pub fn hrp_prefix(self) -> &'static str {
        match self {
            EntityType::Account => "account",
            EntityType::Identity => "identity",
            EntityType::Resource => "resource",
            EntityType::Component => "component",
            EntityType::Package => "package",
            EntityType::Validator => "validator",
        }
    }

    fn from_hrp_prefix(prefix: &str) -> Option<EntityType> {
        Self::ALL.into_iter().find(|e| e.hrp_prefix() == prefix)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hrp_prefix())
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A global entity address on a specific network.
///
/// # Examples
///
/// ```
/// use quill_protocol::crypto::keys::Keypair;
/// use quill_protocol::manifest::address::Address;
/// use quill_protocol::network::NetworkId;
///
/// let kp = Keypair::from_seed(&[1u8; 32]);
/// let account = Address::virtual_account(&kp.public_key(), NetworkId::STOKENET);
/// let text = account.to_string();
/// assert!(text.starts_with("account_tdx_2_1"));
/// assert_eq!(text.parse::<Address>().unwrap(), account);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    network: NetworkId,
    node_id: [u8; NODE_ID_LENGTH],
}

impl Address {
    /// Assemble an address from an entity kind and a 29-byte body.
    pub fn from_parts(entity: EntityType, network: NetworkId, body: [u8; BODY_LENGTH]) -> Self {
        let mut node_id = [0u8; NODE_ID_LENGTH];
        node_id[0] = entity.entity_byte();
        node_id[1..].copy_from_slice(&body);
        Self { network, node_id }
    }

    /// The virtual account controlled by `public_key`.
    pub fn virtual_account(public_key: &PublicKey, network: NetworkId) -> Self {
        Self::virtual_entity(EntityType::Account, public_key, network)
    }

    /// The virtual identity controlled by `public_key`.
    pub fn virtual_identity(public_key: &PublicKey, network: NetworkId) -> Self {
        Self::virtual_entity(EntityType::Identity, public_key, network)
    }

    fn virtual_entity(entity: EntityType, public_key: &PublicKey, network: NetworkId) -> Self {
        let digest = blake3_hash(public_key.as_bytes());
        let mut body = [0u8; BODY_LENGTH];
        body.copy_from_slice(&digest[32 - BODY_LENGTH..]);
        Self::from_parts(entity, network, body)
    }

    pub fn network_id(&self) -> NetworkId {
        self.network
    }

    pub fn node_id(&self) -> &[u8; NODE_ID_LENGTH] {
        &self.node_id
    }

    pub fn entity_type(&self) -> EntityType {
        // Only constructors that check the entity byte exist.
        EntityType::ALL
            .into_iter()
            .find(|e| e.entity_byte() == self.node_id[0])
            .unwrap_or(EntityType::Component)
    }

    pub fn is_account(&self) -> bool {
        self.entity_type() == EntityType::Account
    }

    /// Fail unless this address is of the `expected` kind.
    pub fn expect_entity(self, expected: EntityType) -> Result<Self, AddressError> {
        let got = self.entity_type();
        if got == expected {
            Ok(self)
        } else {
            Err(AddressError::WrongEntityType { expected, got })
        }
    }

    fn hrp_string(&self) -> String {
        format!(
            "{}_{}",
            self.entity_type().hrp_prefix(),
            self.network.hrp_suffix()
        )
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;
        let hrp = hrp.as_str().to_ascii_lowercase();

        let (prefix, suffix) = hrp
            .split_once('_')
            .ok_or_else(|| AddressError::MalformedHrp(hrp.clone()))?;
        let entity = EntityType::from_hrp_prefix(prefix)
            .ok_or_else(|| AddressError::UnknownEntity(prefix.to_string()))?;
        let network = NetworkId::from_hrp_suffix(suffix)
            .ok_or_else(|| AddressError::UnknownNetwork(suffix.to_string()))?;

        let node_id: [u8; NODE_ID_LENGTH] =
            data.as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: NODE_ID_LENGTH,
                    got: data.len(),
                })?;
        if node_id[0] != entity.entity_byte() {
            return Err(AddressError::EntityMismatch {
                byte: node_id[0],
                hrp_entity: prefix.to_string(),
            });
        }

        Ok(Self { network, node_id })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = Hrp::parse(&self.hrp_string()).map_err(|_| fmt::Error)?;
        let encoded = bech32::encode::<Bech32m>(hrp, &self.node_id).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
