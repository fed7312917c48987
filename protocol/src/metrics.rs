//! # Prometheus Metrics
//!
//! Counters for the submission pipeline. All metrics live in a dedicated
//! [`prometheus::Registry`] under the `quill` namespace so embedding
//! applications can merge or scrape them without clashing with their own.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::WalletErrorType;

/// Metric handles for one [`TransactionClient`](crate::client::TransactionClient).
///
/// Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct ClientMetrics {
    registry: Registry,
    /// Notarized transactions handed to the gateway.
    pub transactions_submitted_total: IntCounter,
    /// Submissions the gateway reported as already seen.
    pub transactions_duplicate_total: IntCounter,
    /// Status queries issued.
    pub status_polls_total: IntCounter,
    /// Status queries that failed in transport.
    pub status_poll_errors_total: IntCounter,
    /// Failures by wallet error category.
    pub transaction_failures_total: IntCounterVec,
    /// Time from submission (or resumed polling) to a terminal status.
    pub submission_duration_seconds: Histogram,
}

impl ClientMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("quill".into()), None)?;

        let transactions_submitted_total = IntCounter::new(
            "transactions_submitted_total",
            "Notarized transactions submitted to the gateway",
        )?;
        registry.register(Box::new(transactions_submitted_total.clone()))?;

        let transactions_duplicate_total = IntCounter::new(
            "transactions_duplicate_total",
            "Submissions reported as duplicates by the gateway",
        )?;
        registry.register(Box::new(transactions_duplicate_total.clone()))?;

        let status_polls_total =
            IntCounter::new("status_polls_total", "Transaction status queries issued")?;
        registry.register(Box::new(status_polls_total.clone()))?;

        let status_poll_errors_total = IntCounter::new(
            "status_poll_errors_total",
            "Transaction status queries that failed",
        )?;
        registry.register(Box::new(status_poll_errors_total.clone()))?;

        let transaction_failures_total = IntCounterVec::new(
            Opts::new(
                "transaction_failures_total",
                "Failed transactions by wallet error category",
            ),
            &["category"],
        )?;
        registry.register(Box::new(transaction_failures_total.clone()))?;

        let submission_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "submission_duration_seconds",
                "Seconds from submission to a terminal ledger status",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0]),
        )?;
        registry.register(Box::new(submission_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            transactions_submitted_total,
            transactions_duplicate_total,
            status_polls_total,
            status_poll_errors_total,
            transaction_failures_total,
            submission_duration_seconds,
        })
    }

    /// Count a failure under its wallet error category.
    pub fn record_failure(&self, category: WalletErrorType) {
        self.transaction_failures_total
            .with_label_values(&[category.as_str()])
            .inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
