//! # Status Polling
//!
//! After submission the wallet asks the gateway for the transaction status
//! until the ledger reaches a verdict:
//!
//! ```text
//! try 1 ──► status? ──► terminal ──► done
//!              │
//!              └─ pending / error ──► sleep(delay) ──► try 2 ──► ...
//!
//! after max_tries queries without a verdict ──► FailedToPollTxStatus
//! ```
//!
//! Failed queries are absorbed: they count toward `max_tries` like any
//! other try. The consecutive-error counter only decides how loudly the
//! poller logs.
//!
//! Polling is the only retried stage. A notarized transaction is never
//! resubmitted from here.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{LedgerStatus, TransactionGateway};
use crate::config::{POLL_DELAY_BETWEEN_TRIES, POLL_MAX_CONSECUTIVE_ERRORS, POLL_MAX_TRIES};
use crate::error::TransactionApprovalFailure;
use crate::metrics::ClientMetrics;
use crate::transaction::intent::TransactionId;

/// How often, and how many times, to ask for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollStrategy {
    /// Upper bound on status queries.
    pub max_tries: u32,
    /// Pause between two queries, in milliseconds.
    pub delay_between_tries_ms: u64,
    /// Consecutive failed queries before the poller starts warning.
    pub max_consecutive_errors: u32,
}

impl Default for PollStrategy {
    fn default() -> Self {
        Self {
            max_tries: POLL_MAX_TRIES,
            delay_between_tries_ms: POLL_DELAY_BETWEEN_TRIES.as_millis() as u64,
            max_consecutive_errors: POLL_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl PollStrategy {
    pub fn new(max_tries: u32, delay_between_tries: Duration) -> Self {
        Self {
            max_tries,
            delay_between_tries_ms: delay_between_tries.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn delay_between_tries(&self) -> Duration {
        Duration::from_millis(self.delay_between_tries_ms)
    }
}

/// Poll until the ledger settles `tx_id` or the strategy runs out.
///
/// Returns `Ok(tx_id)` on `CommittedSuccess`, `GatewayCommittedFailure` or
/// `GatewayRejected` on the other terminal statuses, and
/// `FailedToPollTxStatus` after `max_tries` queries without one.
pub async fn poll_until_terminal(
    gateway: &dyn TransactionGateway,
    tx_id: TransactionId,
    strategy: &PollStrategy,
    metrics: Option<&ClientMetrics>,
) -> Result<TransactionId, TransactionApprovalFailure> {
    let started = Instant::now();
    let mut consecutive_errors: u32 = 0;

    for attempt in 1..=strategy.max_tries {
        if let Some(m) = metrics {
            m.status_polls_total.inc();
        }

        match gateway.status(&tx_id).await {
            Ok(status) => {
                consecutive_errors = 0;
                debug!(tx_id = %tx_id, attempt, status = %status, "status polled");
                match status {
                    LedgerStatus::CommittedSuccess => {
                        observe_duration(metrics, started);
                        info!(tx_id = %tx_id, attempts = attempt, "transaction committed");
                        return Ok(tx_id);
                    }
                    LedgerStatus::CommittedFailure => {
                        observe_duration(metrics, started);
                        warn!(tx_id = %tx_id, "transaction committed with failure");
                        return Err(TransactionApprovalFailure::GatewayCommittedFailure { tx_id });
                    }
                    LedgerStatus::Rejected => {
                        observe_duration(metrics, started);
                        warn!(tx_id = %tx_id, "transaction rejected");
                        return Err(TransactionApprovalFailure::GatewayRejected { tx_id });
                    }
                    LedgerStatus::Pending | LedgerStatus::Unknown => {}
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                if let Some(m) = metrics {
                    m.status_poll_errors_total.inc();
                }
                if consecutive_errors >= strategy.max_consecutive_errors {
                    warn!(
                        tx_id = %tx_id,
                        attempt,
                        consecutive_errors,
                        error = %e,
                        "status queries keep failing"
                    );
                } else {
                    debug!(tx_id = %tx_id, attempt, error = %e, "status query failed");
                }
            }
        }

        if attempt < strategy.max_tries {
            tokio::time::sleep(strategy.delay_between_tries()).await;
        }
    }

    warn!(
        tx_id = %tx_id,
        max_tries = strategy.max_tries,
        "no terminal status; giving up"
    );
    Err(TransactionApprovalFailure::FailedToPollTxStatus { tx_id })
}

fn observe_duration(metrics: Option<&ClientMetrics>, started: Instant) {
    if let Some(m) = metrics {
        m.submission_duration_seconds
            .observe(started.elapsed().as_secs_f64());
    }
}
