//! # Submission Lifecycle
//!
//! ```text
//! Built ──► Submitted ──┬──► Duplicate
//!                       └──► Polling ──┬──► CommittedSuccess
//!                                      ├──► CommittedFailure
//!                                      ├──► Rejected
//!                                      └──► PollTimeout
//! ```
//!
//! [`SubmissionTracker`] records where one transaction is in this flow.
//! Out-of-order transitions are ignored and terminal states never change,
//! so a late status answer cannot overwrite a verdict.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::TransactionApprovalFailure;
use crate::transaction::intent::TransactionId;

/// Where a transaction is in the submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionState {
    /// Notarized, not yet sent.
    Built,
    /// Accepted by the submission endpoint.
    Submitted,
    /// Terminal: the gateway had already seen this id.
    Duplicate,
    /// Waiting for the ledger's verdict.
    Polling,
    /// Terminal.
    CommittedSuccess,
    /// Terminal.
    CommittedFailure,
    /// Terminal.
    Rejected,
    /// Terminal: the poll budget ran out without a verdict.
    PollTimeout,
}

impl SubmissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionState::Duplicate
                | SubmissionState::CommittedSuccess
                | SubmissionState::CommittedFailure
                | SubmissionState::Rejected
                | SubmissionState::PollTimeout
        )
    }
}

/// Tracks one transaction from notarization to verdict.
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    tx_id: TransactionId,
    state: SubmissionState,
    started_at: Instant,
}

impl SubmissionTracker {
    /// Start tracking a freshly notarized transaction.
    pub fn new(tx_id: TransactionId) -> Self {
        Self {
            tx_id,
            state: SubmissionState::Built,
            started_at: Instant::now(),
        }
    }

    /// Pick up a transaction that was submitted earlier, e.g. after the
    /// previous flow was cancelled mid-poll.
    pub fn resumed(tx_id: TransactionId) -> Self {
        Self {
            tx_id,
            state: SubmissionState::Submitted,
            started_at: Instant::now(),
        }
    }

    pub fn tx_id(&self) -> TransactionId {
        self.tx_id
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn mark_submitted(&mut self) {
        if self.state == SubmissionState::Built {
            self.state = SubmissionState::Submitted;
        }
    }

    pub fn mark_duplicate(&mut self) {
        if self.state == SubmissionState::Submitted {
            self.state = SubmissionState::Duplicate;
        }
    }

    pub fn mark_polling(&mut self) {
        if self.state == SubmissionState::Submitted {
            self.state = SubmissionState::Polling;
        }
    }

    /// Record the outcome of the poll loop.
    pub fn finish(&mut self, outcome: &Result<TransactionId, TransactionApprovalFailure>) {
        if self.state != SubmissionState::Polling {
            return;
        }
        self.state = match outcome {
            Ok(_) => SubmissionState::CommittedSuccess,
            Err(TransactionApprovalFailure::GatewayCommittedFailure { .. }) => {
                SubmissionState::CommittedFailure
            }
            Err(TransactionApprovalFailure::GatewayRejected { .. }) => SubmissionState::Rejected,
            Err(TransactionApprovalFailure::FailedToPollTxStatus { .. }) => {
                SubmissionState::PollTimeout
            }
            // Anything else is not a poll verdict.
            Err(_) => return,
        };
    }
}
