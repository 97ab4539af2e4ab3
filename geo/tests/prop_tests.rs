use proptest::prelude::*;

use rollcall_geo::{decode_bounds, encode, GeocellCode, MAX_PRECISION};

proptest! {
    /// Encoding the same input twice yields the same code.
    #[test]
    fn encoding_is_deterministic(
        lat in -90.0f64..=90.0,
        lon in -180.0f64..=180.0,
        precision in 1usize..=MAX_PRECISION,
    ) {
        let a = encode(lat, lon, precision).unwrap();
        let b = encode(lat, lon, precision).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Raising the precision only ever appends symbols.
    #[test]
    fn higher_precision_refines(
        lat in -90.0f64..=90.0,
        lon in -180.0f64..=180.0,
        precision in 1usize..MAX_PRECISION,
    ) {
        let coarse = encode(lat, lon, precision).unwrap();
        let fine = encode(lat, lon, precision + 1).unwrap();
        prop_assert_eq!(fine.precision(), precision + 1);
        prop_assert!(coarse.contains(&fine));
    }

    /// The decoded cell contains the encoded point.
    #[test]
    fn decoded_bounds_contain_point(
        lat in -89.9f64..89.9,
        lon in -179.9f64..179.9,
        precision in 1usize..=MAX_PRECISION,
    ) {
        let code = encode(lat, lon, precision).unwrap();
        prop_assert!(decode_bounds(&code).contains(lat, lon));
    }

    /// Every encoded code survives validation.
    #[test]
    fn encoded_codes_parse(
        lat in -90.0f64..=90.0,
        lon in -180.0f64..=180.0,
        precision in 1usize..=MAX_PRECISION,
    ) {
        let code = encode(lat, lon, precision).unwrap();
        prop_assert_eq!(GeocellCode::parse(code.as_str()).unwrap(), code);
    }

    /// Latitudes outside [-90, 90] are rejected.
    #[test]
    fn out_of_range_latitude_rejected(lat in 90.0001f64..1_000.0, lon in -180.0f64..=180.0) {
        prop_assert!(encode(lat, lon, 5).is_err());
        prop_assert!(encode(-lat, lon, 5).is_err());
    }
}
