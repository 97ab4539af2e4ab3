#![no_main]

use libfuzzer_sys::fuzz_target;
use rollcall_submission::TransactionEnvelope;

fuzz_target!(|data: &[u8]| {
    // Queue items hold envelope bytes read back from disk.
    if let Ok(envelope) = TransactionEnvelope::from_bytes(data) {
        let _ = envelope.verify();
        let _ = envelope.hash();
    }
});
