//! Geocell encoding.
//!
//! A geocell code is produced by repeatedly halving the longitude range
//! [-180, 180] and the latitude range [-90, 90], alternating axes and starting
//! with longitude. Each halving yields one bit (1 = upper half); every 5 bits
//! become one symbol of the base-32 alphabet below. A code of precision `p`
//! is always a prefix of the code of precision `p + 1` for the same point.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GeoError;

/// Maximum supported precision (symbols). 12 symbols is well below a metre.
pub const MAX_PRECISION: usize = 12;

/// Base-32 alphabet (omits a, i, l, o).
const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// A validated geocell code: 1..=12 symbols of the geocell alphabet.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeocellCode(String);

impl GeocellCode {
    /// Validate a code received from outside (e.g. a scanned claim).
    pub fn parse(s: &str) -> Result<Self, GeoError> {
        if s.is_empty() || s.len() > MAX_PRECISION {
            return Err(GeoError::InvalidCode(format!(
                "length {} outside 1..={MAX_PRECISION}",
                s.len()
            )));
        }
        if let Some(bad) = s.bytes().find(|b| !is_symbol(*b)) {
            return Err(GeoError::InvalidCode(format!(
                "character {:?} is not in the geocell alphabet",
                bad as char
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols in the code.
    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// The first `len` symbols of the code (the whole code if shorter).
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Whether `other` lies inside this cell (this code is a prefix of it).
    pub fn contains(&self, other: &GeocellCode) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl TryFrom<String> for GeocellCode {
    type Error = GeoError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GeocellCode> for String {
    fn from(code: GeocellCode) -> Self {
        code.0
    }
}

impl fmt::Debug for GeocellCode {
    // Never print the raw cell: it identifies a place.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeocellCode(<{} symbols>)", self.0.len())
    }
}

fn is_symbol(b: u8) -> bool {
    b < 128 && DECODE[b as usize] != 0xFF
}

/// Encode a coordinate pair into a geocell code of the given precision.
pub fn encode(lat: f64, lon: f64, precision: usize) -> Result<GeocellCode, GeoError> {
    if !(lat.is_finite() && lon.is_finite())
        || !(-90.0..=90.0).contains(&lat)
        || !(-180.0..=180.0).contains(&lon)
    {
        return Err(GeoError::InvalidCoordinate { lat, lon });
    }
    if precision == 0 || precision > MAX_PRECISION {
        return Err(GeoError::InvalidPrecision(precision));
    }

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut code = String::with_capacity(precision);
    let mut symbol = 0usize;
    let mut bits = 0;
    let mut on_lon = true;

    while code.len() < precision {
        let (range, value) = if on_lon {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            symbol = (symbol << 1) | 1;
            range.0 = mid;
        } else {
            symbol <<= 1;
            range.1 = mid;
        }
        on_lon = !on_lon;
        bits += 1;

        if bits == 5 {
            code.push(ALPHABET[symbol] as char);
            symbol = 0;
            bits = 0;
        }
    }

    Ok(GeocellCode(code))
}

/// Bounding box of a geocell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl CellBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Recover the bounding box covered by a geocell code.
pub fn decode_bounds(code: &GeocellCode) -> CellBounds {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut on_lon = true;

    for b in code.0.bytes() {
        // Validated on construction, so every byte decodes.
        let value = DECODE[b as usize];
        for shift in (0..5).rev() {
            let range = if on_lon {
                &mut lon_range
            } else {
                &mut lat_range
            };
            let mid = (range.0 + range.1) / 2.0;
            if (value >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            on_lon = !on_lon;
        }
    }

    CellBounds {
        min_lat: lat_range.0,
        max_lat: lat_range.1,
        min_lon: lon_range.0,
        max_lon: lon_range.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        let code = encode(57.64911, 10.40744, 11).unwrap();
        assert_eq!(code.as_str(), "u4pruydqqvj");
    }

    #[test]
    fn midtown_manhattan() {
        assert_eq!(encode(40.7484, -73.9857, 5).unwrap().as_str(), "dr5ru");
        assert_eq!(encode(40.7484, -73.9857, 7).unwrap().as_str(), "dr5ru6j");
    }

    #[test]
    fn corners() {
        assert_eq!(encode(0.0, 0.0, 5).unwrap().as_str(), "s0000");
        assert_eq!(encode(-90.0, -180.0, 5).unwrap().as_str(), "00000");
        assert_eq!(encode(90.0, 180.0, 5).unwrap().as_str(), "zzzzz");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            encode(90.5, 0.0, 5),
            Err(GeoError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            encode(0.0, -180.1, 5),
            Err(GeoError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            encode(f64::NAN, 0.0, 5),
            Err(GeoError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn rejects_bad_precision() {
        assert_eq!(encode(1.0, 1.0, 0), Err(GeoError::InvalidPrecision(0)));
        assert_eq!(encode(1.0, 1.0, 13), Err(GeoError::InvalidPrecision(13)));
    }

    #[test]
    fn decode_bounds_of_known_cell() {
        let cell = GeocellCode::parse("dr5ru").unwrap();
        let b = decode_bounds(&cell);
        assert_eq!(b.min_lat, 40.7373046875);
        assert_eq!(b.max_lat, 40.78125);
        assert_eq!(b.min_lon, -74.00390625);
        assert_eq!(b.max_lon, -73.9599609375);
        assert!(b.contains(40.7484, -73.9857));
    }

    #[test]
    fn parse_rejects_foreign_symbols() {
        assert!(GeocellCode::parse("dr5ra").is_err());
        assert!(GeocellCode::parse("").is_err());
        assert!(GeocellCode::parse("0123456789bcd").is_err());
        assert!(GeocellCode::parse("DR5RU").is_err());
    }

    #[test]
    fn prefix_and_contains() {
        let coarse = GeocellCode::parse("dr5r").unwrap();
        let fine = GeocellCode::parse("dr5ru6j").unwrap();
        assert!(coarse.contains(&fine));
        assert!(!fine.contains(&coarse));
        assert_eq!(fine.prefix(4), "dr5r");
        assert_eq!(coarse.prefix(10), "dr5r");
    }

    #[test]
    fn debug_hides_cell() {
        let code = GeocellCode::parse("dr5ru").unwrap();
        assert!(!format!("{code:?}").contains("dr5ru"));
    }
}
