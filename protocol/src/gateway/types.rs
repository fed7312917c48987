//! Collaborator contracts: what the pipeline needs from the ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::transaction::header::Epoch;
use crate::transaction::intent::TransactionId;

/// Errors reported by a gateway or ledger-info implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not what the gateway contract promises.
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

/// Status of a transaction as the ledger sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// The gateway has never heard of the transaction.
    Unknown,
    Pending,
    CommittedSuccess,
    CommittedFailure,
    Rejected,
}

impl LedgerStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LedgerStatus::CommittedSuccess | LedgerStatus::CommittedFailure | LedgerStatus::Rejected
        )
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerStatus::Unknown => "Unknown",
            LedgerStatus::Pending => "Pending",
            LedgerStatus::CommittedSuccess => "CommittedSuccess",
            LedgerStatus::CommittedFailure => "CommittedFailure",
            LedgerStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Answer to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// The gateway had already seen this transaction id.
    pub duplicate: bool,
}

/// Source of the current ledger epoch.
#[async_trait]
pub trait LedgerInfo: Send + Sync {
    async fn current_epoch(&self) -> Result<Epoch, GatewayError>;
}

/// Submission endpoint plus status lookup.
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Submit a hex-encoded compiled notarized transaction.
    async fn submit(&self, notarized_hex: &str) -> Result<SubmitResponse, GatewayError>;

    /// Look up the status of a submitted transaction.
    async fn status(&self, tx_id: &TransactionId) -> Result<LedgerStatus, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!LedgerStatus::Unknown.is_terminal());
        assert!(!LedgerStatus::Pending.is_terminal());
        assert!(LedgerStatus::CommittedSuccess.is_terminal());
        assert!(LedgerStatus::CommittedFailure.is_terminal());
        assert!(LedgerStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_wire_names() {
        let parsed: LedgerStatus = serde_json::from_str("\"CommittedSuccess\"").unwrap();
        assert_eq!(parsed, LedgerStatus::CommittedSuccess);
        assert_eq!(parsed.to_string(), "CommittedSuccess");
    }
}
