#![no_main]

use libfuzzer_sys::fuzz_target;
use rollcall_types::VerificationParams;
use rollcall_verification::{verify_claim_signature, TrustedIssuers};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Scanned text is untrusted: parsing must never panic.
    let Ok(claim) = rollcall_claims::parse_claim(raw, &VerificationParams::default()) else {
        return;
    };

    // Anything that passed the schema must survive the later stages too.
    let _ = claim.signing_message();
    let _ = claim.digest();
    let _ = claim.zone.digests();
    assert!(verify_claim_signature(&claim, &TrustedIssuers::default()).is_err());
});
