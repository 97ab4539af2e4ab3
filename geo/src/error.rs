use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid precision {0}: must be between 1 and 12")]
    InvalidPrecision(usize),

    #[error("invalid geocell code: {0}")]
    InvalidCode(String),
}
