#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rollcall_geo::{decode_bounds, encode, GeocellCode};

#[derive(Arbitrary, Debug)]
struct Input {
    lat: f64,
    lon: f64,
    precision: u8,
    code: String,
}

fuzz_target!(|input: Input| {
    let precision = usize::from(input.precision);

    if let Ok(code) = encode(input.lat, input.lon, precision) {
        assert_eq!(code.precision(), precision);
        // Deterministic, and refined by one more symbol.
        assert_eq!(encode(input.lat, input.lon, precision), Ok(code.clone()));
        if let Ok(finer) = encode(input.lat, input.lon, precision + 1) {
            assert!(code.contains(&finer));
        }
        assert!(decode_bounds(&code).contains(input.lat, input.lon));
    }

    if let Ok(code) = GeocellCode::parse(&input.code) {
        let _ = decode_bounds(&code);
    }
});
