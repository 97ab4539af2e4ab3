//! Rollcall device agent.
//!
//! The agent owns the on-device pieces of the pipeline and runs them:
//! - Opens the LMDB environment and loads the nonce ledger
//! - Verifies scanned claims and reports verdicts to the scanner
//! - Signs and queues accepted claims
//! - Drains the submission queue in the background until shutdown

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod shutdown;
pub mod tracing_spans;

pub use agent::{Agent, ScanOutcome};
pub use config::AgentConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::AgentMetrics;
pub use shutdown::{ShutdownController, ShutdownSignal};
