//! Spatial primitives for zone-scoped claims.
//!
//! - **Geocells**: coordinates quantized into bounded-precision base-32 cell
//!   codes by recursive binary subdivision. Longer codes are strictly finer.
//! - **Location**: the device-location collaborator interface. The pipeline
//!   only ever asks for a coarse fix and converts it to a geocell immediately.

pub mod error;
pub mod geocell;
pub mod location;

pub use error::GeoError;
pub use geocell::{decode_bounds, encode, CellBounds, GeocellCode, MAX_PRECISION};
pub use location::{
    acquire_coarse, Coordinates, DenialReason, LocationError, LocationOutcome, LocationProvider,
};
