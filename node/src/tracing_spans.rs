//! Span constructors for the agent's main operations.
//!
//! Consistent span names and fields make verification and submission traces
//! easy to filter and correlate.

use tracing::{info_span, Span};

/// Span covering one scanned payload from schema check to final verdict.
pub fn verify_span(payload_len: usize) -> Span {
    info_span!("verify", payload_len)
}

/// Span covering the hand-off of an accepted claim to the submission queue.
pub fn submit_span(claim: &str) -> Span {
    info_span!("submit", claim = %claim)
}

/// Span covering one pass of the submission worker.
pub fn drain_span(depth: u64) -> Span {
    info_span!("drain", depth)
}
