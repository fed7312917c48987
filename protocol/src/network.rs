//! # Networks
//!
//! Every transaction is bound to exactly one network. The id goes into the
//! header, and each address carries its network in the HRP suffix, so a
//! mainnet account can never end up in a stokenet manifest by accident.
//!
//! ```text
//! id    name        suffix     example
//! 1     mainnet     rdx        account_rdx1...
//! 2     stokenet    tdx_2_     account_tdx_2_1...
//! 242   simulator   sim        account_sim1...
//! n     (other)     tdx_{n:x}_ account_tdx_f_1...
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::manifest::address::{Address, EntityType};

/// Identifier of a ledger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub u8);

impl NetworkId {
    pub const MAINNET: NetworkId = NetworkId(1);
    pub const STOKENET: NetworkId = NetworkId(2);
    pub const SIMULATOR: NetworkId = NetworkId(242);

    /// Raw id byte.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Short human-readable name. Unnamed networks print as `network-{id}`.
    pub fn name(self) -> String {
        match self.0 {
            1 => "mainnet".to_string(),
            2 => "stokenet".to_string(),
            242 => "simulator".to_string(),
            n => format!("network-{n}"),
        }
    }

    /// The HRP suffix appended to every entity prefix on this network.
    pub fn hrp_suffix(self) -> String {
        match self.0 {
            1 => "rdx".to_string(),
            242 => "sim".to_string(),
            n => format!("tdx_{n:x}_"),
        }
    }

    /// Reverse of [`NetworkId::hrp_suffix`].
    pub fn from_hrp_suffix(suffix: &str) -> Option<NetworkId> {
        match suffix {
            "rdx" => Some(Self::MAINNET),
            "sim" => Some(Self::SIMULATOR),
            other => {
                let hex_id = other.strip_prefix("tdx_")?.strip_suffix('_')?;
                if hex_id.is_empty() || hex_id.len() > 2 {
                    return None;
                }
                let id = u8::from_str_radix(hex_id, 16).ok()?;
                // Canonical form only: mainnet and simulator have their own suffix,
                // and no leading zeros.
                let network = NetworkId(id);
                (network.hrp_suffix() == other).then_some(network)
            }
        }
    }

    /// Faucet component, native token and account package on this network.
    pub fn known_addresses(self) -> KnownAddresses {
        known_addresses(self)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for NetworkId {
    fn from(id: u8) -> Self {
        NetworkId(id)
    }
}

// ---------------------------------------------------------------------------
// Well-known entities
// ---------------------------------------------------------------------------

/// System entities every network ships at genesis. Their node ids are fixed;
/// only the network suffix differs between networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownAddresses {
    pub faucet: Address,
    pub native_token: Address,
    pub account_package: Address,
}

const FAUCET_NODE_ID: [u8; 29] = well_known_id(0x01);
const NATIVE_TOKEN_NODE_ID: [u8; 29] = well_known_id(0x02);
const ACCOUNT_PACKAGE_NODE_ID: [u8; 29] = well_known_id(0x03);

/// Genesis entities have an all-zero body except for their index in the last
/// byte.
const fn well_known_id(index: u8) -> [u8; 29] {
    let mut id = [0u8; 29];
    id[28] = index;
    id
}

/// Look up the system entities of `network`.
pub fn known_addresses(network: NetworkId) -> KnownAddresses {
    KnownAddresses {
        faucet: Address::from_parts(EntityType::Component, network, FAUCET_NODE_ID),
        native_token: Address::from_parts(EntityType::Resource, network, NATIVE_TOKEN_NODE_ID),
        account_package: Address::from_parts(
            EntityType::Package,
            network,
            ACCOUNT_PACKAGE_NODE_ID,
        ),
    }
}
