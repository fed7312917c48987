//! # Protocol Configuration & Constants
//!
//! Every magic number the transaction pipeline depends on lives here. The
//! ledger enforces most of these on its side, so changing one without a
//! matching ledger upgrade gets your transactions rejected, not "tuned".
//!
//! Values that a caller may legitimately vary per wallet (lock fee and
//! poll cadence) are carried by [`ClientConfig`] instead, with these
//! constants as defaults. The tip is not one of them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gateway::poll::PollStrategy;
use crate::manifest::decimal::Decimal;

// ---------------------------------------------------------------------------
// Transaction Header
// ---------------------------------------------------------------------------

/// Version byte written into every transaction header. The ledger refuses
/// versions it does not know, so this only moves with a ledger upgrade.
pub const TRANSACTION_VERSION: u8 = 1;

/// Number of epochs a transaction stays valid for, counted from the epoch
/// the header was built in. `end_epoch_exclusive = start + EPOCH_WINDOW`.
///
/// The ledger drops anything whose end epoch has passed, so a header is
/// never extended after the fact: a stale header means a fresh build.
pub const EPOCH_WINDOW: u64 = 10;

/// Execution cost-unit ceiling declared in the header.
pub const COST_UNIT_LIMIT: u32 = 100_000_000;

/// Validator tip, as a percentage of the execution fee. Zero: we pay the
/// fee, not a bribe.
pub const TIP_PERCENTAGE: u16 = 0;

/// The notary never doubles as an intent signer in this design.
pub const NOTARY_IS_SIGNATORY: bool = false;

/// Length of the anti-replay nonce in bytes (interpreted as a `u64`).
pub const NONCE_LENGTH: usize = 8;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Amount of native token locked for fees when the wallet injects the
/// `lock_fee` instruction, in whole units.
pub const DEFAULT_LOCK_FEE: u64 = 10;

/// Amount locked by the faucet template. The faucet pays its own way on
/// test networks.
pub const FAUCET_LOCK_FEE: u64 = 5_000;

// ---------------------------------------------------------------------------
// Status Polling
// ---------------------------------------------------------------------------

/// Maximum number of status queries before the wallet gives up on a
/// submitted transaction.
pub const POLL_MAX_TRIES: u32 = 20;

/// Pause between two status queries. 20 tries * 2 s is a little over the
/// time it takes the ledger to move a full epoch window on a quiet network.
pub const POLL_DELAY_BETWEEN_TRIES: Duration = Duration::from_millis(2_000);

/// Consecutive failed status queries after which the poller starts
/// complaining loudly. It keeps polling regardless.
pub const POLL_MAX_CONSECUTIVE_ERRORS: u32 = 3;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Prefix byte of every compiled payload. Lets a decoder reject foreign
/// bytes before trying to parse them.
pub const PAYLOAD_PREFIX: u8 = 0x4d;

/// Number of fractional digits carried by [`Decimal`].
pub const DECIMAL_SCALE: u32 = 18;

/// Length of an entity node id inside an address.
pub const NODE_ID_LENGTH: usize = 30;

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Per-wallet tunables for the transaction client.
///
/// Deserializes from JSON with every field optional, so a config file only
/// needs to mention what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Amount locked for fees by the injected `lock_fee` instruction.
    pub lock_fee: Decimal,
    /// Status polling cadence.
    pub poll: PollStrategy,
    /// Accept manifests supplied as opaque text. Such manifests cannot be
    /// amended, so they go out without an injected fee lock and without
    /// any signer besides the notary.
    pub allow_opaque_manifests: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lock_fee: Decimal::from(DEFAULT_LOCK_FEE),
            poll: PollStrategy::default(),
            allow_opaque_manifests: false,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
