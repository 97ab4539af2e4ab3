//! Device location collaborator.
//!
//! The platform supplies a [`LocationProvider`]; the pipeline wraps every
//! request in [`acquire_coarse`], which bounds it with a timeout and folds
//! every failure into [`LocationOutcome::Denied`]. Denial is reported
//! separately from a zone mismatch because the user fixes them differently.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// A transient coarse position. Converted to a geocell and dropped right away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Failure reported by the location collaborator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Why no usable position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    PermissionDenied,
    Unavailable,
    TimedOut,
}

/// Result of a bounded coarse location request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    Observed(Coordinates),
    Denied(DenialReason),
}

/// Source of the device's current position.
///
/// Implementations must only ever produce a coarse (network/cell-level) fix;
/// the trait offers no way to ask for more.
pub trait LocationProvider: Send + Sync {
    fn coarse_position(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Request a coarse position, bounded by `timeout`.
///
/// Dropping the returned future cancels the underlying request.
pub async fn acquire_coarse<P: LocationProvider>(provider: &P, timeout: Duration) -> LocationOutcome {
    match tokio::time::timeout(timeout, provider.coarse_position()).await {
        Ok(Ok(coords)) => LocationOutcome::Observed(coords),
        Ok(Err(LocationError::PermissionDenied)) => {
            debug!("location permission denied");
            LocationOutcome::Denied(DenialReason::PermissionDenied)
        }
        Ok(Err(LocationError::Unavailable(reason))) => {
            debug!(%reason, "location unavailable");
            LocationOutcome::Denied(DenialReason::Unavailable)
        }
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis() as u64, "location request timed out");
            LocationOutcome::Denied(DenialReason::TimedOut)
        }
    }
}
