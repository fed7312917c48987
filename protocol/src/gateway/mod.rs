//! # Gateway
//!
//! Everything that talks to the ledger after notarization: the collaborator
//! traits, the HTTP adapter, the status poller and the submission state
//! machine.

pub mod http;
pub mod poll;
pub mod state;
pub mod types;

pub use http::HttpGateway;
pub use poll::{poll_until_terminal, PollStrategy};
pub use state::{SubmissionState, SubmissionTracker};
pub use types::{GatewayError, LedgerInfo, LedgerStatus, SubmitResponse, TransactionGateway};
