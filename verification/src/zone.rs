//! Zone matching.
//!
//! The observed position is encoded once, at the longest precision any
//! allowed cell uses, and the coordinates are dropped. Each allowed cell is
//! then compared on its first `len - tolerance` symbols, so a tolerance of
//! `k` accepts any position within `k` levels of the allowed cell.

use rollcall_claims::ZoneDescriptor;
use rollcall_geo::{encode, LocationOutcome};
use tracing::debug;

use crate::ZoneStatus;

pub fn match_zone(location: &LocationOutcome, zone: &ZoneDescriptor) -> ZoneStatus {
    let coords = match location {
        LocationOutcome::Observed(coords) => *coords,
        LocationOutcome::Denied(reason) => {
            debug!(?reason, "no location for zone match");
            return ZoneStatus::Denied;
        }
    };

    let observed = match encode(coords.latitude, coords.longitude, zone.max_precision()) {
        Ok(code) => code,
        Err(e) => {
            debug!(error = %e, "location provider returned an unusable position");
            return ZoneStatus::Denied;
        }
    };

    let tolerance = usize::from(zone.tolerance);
    let matched = zone.cells.iter().any(|allowed| {
        let keep = allowed.precision().saturating_sub(tolerance);
        keep > 0 && observed.prefix(keep) == allowed.prefix(keep)
    });

    if matched {
        ZoneStatus::Valid
    } else {
        ZoneStatus::Mismatch
    }
}
