//! Prometheus metrics for the agent.
//!
//! [`AgentMetrics`] owns its own [`Registry`]; [`AgentMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use std::time::Duration;

use prometheus::{
    exponential_buckets, register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use rollcall_submission::DrainReport;
use rollcall_verification::Verdict;

use crate::NodeError;

pub struct AgentMetrics {
    pub registry: Registry,

    // ── Verification ────────────────────────────────────────────────────
    pub claims_scanned: IntCounter,
    pub claims_accepted: IntCounter,
    /// Rejections, labelled by reason.
    pub claims_rejected: IntCounterVec,
    /// Time from scan to final verdict, in milliseconds. Includes the
    /// location request.
    pub verification_latency_ms: Histogram,

    // ── Submission ──────────────────────────────────────────────────────
    pub submissions_finalized: IntCounter,
    pub submissions_retried: IntCounter,
    pub submissions_failed: IntCounter,
    pub submissions_needs_resign: IntCounter,
    /// Items currently in the submission queue, in any state.
    pub queue_depth: IntGauge,
}

impl AgentMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let claims_scanned = register_int_counter_with_registry!(
            Opts::new("rollcall_claims_scanned_total", "Claims scanned"),
            registry
        )?;
        let claims_accepted = register_int_counter_with_registry!(
            Opts::new("rollcall_claims_accepted_total", "Claims accepted"),
            registry
        )?;
        let claims_rejected = register_int_counter_vec_with_registry!(
            Opts::new("rollcall_claims_rejected_total", "Claims rejected, by reason"),
            &["reason"],
            registry
        )?;
        // 1 ms to ~16 s.
        let verification_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "rollcall_verification_latency_ms",
                "Scan-to-verdict latency in milliseconds"
            )
            .buckets(exponential_buckets(1.0, 2.0, 15)?),
            registry
        )?;

        let submissions_finalized = register_int_counter_with_registry!(
            Opts::new(
                "rollcall_submissions_finalized_total",
                "Transactions finalized by the ledger"
            ),
            registry
        )?;
        let submissions_retried = register_int_counter_with_registry!(
            Opts::new(
                "rollcall_submissions_retried_total",
                "Submission attempts that failed retryably"
            ),
            registry
        )?;
        let submissions_failed = register_int_counter_with_registry!(
            Opts::new(
                "rollcall_submissions_failed_total",
                "Queue items moved to failed"
            ),
            registry
        )?;
        let submissions_needs_resign = register_int_counter_with_registry!(
            Opts::new(
                "rollcall_submissions_needs_resign_total",
                "Queue items parked for re-signing"
            ),
            registry
        )?;
        let queue_depth = register_int_gauge_with_registry!(
            Opts::new("rollcall_queue_depth", "Items in the submission queue"),
            registry
        )?;

        Ok(Self {
            registry,
            claims_scanned,
            claims_accepted,
            claims_rejected,
            verification_latency_ms,
            submissions_finalized,
            submissions_retried,
            submissions_failed,
            submissions_needs_resign,
            queue_depth,
        })
    }

    pub fn record_verdict(&self, verdict: &Verdict, elapsed: Duration) {
        self.claims_scanned.inc();
        self.verification_latency_ms
            .observe(elapsed.as_secs_f64() * 1_000.0);
        if verdict.is_accepted() {
            self.claims_accepted.inc();
        } else if let Some(rejection) = &verdict.rejection {
            self.claims_rejected
                .with_label_values(&[rejection.code()])
                .inc();
        }
    }

    pub fn record_drain(&self, report: &DrainReport) {
        self.submissions_finalized.inc_by(report.finalized as u64);
        self.submissions_retried.inc_by(report.retried as u64);
        self.submissions_failed.inc_by(report.failed as u64);
        self.submissions_needs_resign
            .inc_by(report.needs_resign as u64);
    }

    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(e.to_string()))
    }
}
