//! Canonical signed-message encoding.
//!
//! Layout, after the domain tag:
//!
//! ```text
//! version      u16 BE
//! issuer       u8 length | lowercase hex text
//! event_id     u32 BE length | UTF-8 bytes
//! nonce        u32 BE length | UTF-8 bytes
//! issued_at    u64 BE
//! expires_at   u64 BE
//! zone         u8 tolerance | u16 BE cell count | (u8 length | ASCII)*
//! ```
//!
//! Issued claims are signed over exactly these bytes. Any change to field
//! order or framing invalidates every claim already in circulation.

use crate::Claim;

/// Domain separation tag prepended to every claim message.
pub const CLAIM_DOMAIN: &[u8] = b"rollcall/claim/v1";

pub fn signing_message(claim: &Claim) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        CLAIM_DOMAIN.len()
            + 2
            + 1
            + claim.issuer.len()
            + 4
            + claim.event_id.len()
            + 4
            + claim.nonce.len()
            + 16
            + 3
            + claim.zone.cells.iter().map(|c| 1 + c.precision()).sum::<usize>(),
    );

    out.extend_from_slice(CLAIM_DOMAIN);
    out.extend_from_slice(&claim.version.to_be_bytes());
    put_short(&mut out, claim.issuer.as_bytes());
    put_long(&mut out, claim.event_id.as_bytes());
    put_long(&mut out, claim.nonce.as_bytes());
    out.extend_from_slice(&claim.issued_at.as_secs().to_be_bytes());
    out.extend_from_slice(&claim.expires_at.as_secs().to_be_bytes());

    out.push(claim.zone.tolerance);
    let count = u16::try_from(claim.zone.cells.len()).unwrap_or(u16::MAX);
    out.extend_from_slice(&count.to_be_bytes());
    for cell in claim.zone.cells.iter().take(count as usize) {
        put_short(&mut out, cell.as_str().as_bytes());
    }
    out
}

/// u8 length prefix. Inputs longer than 255 bytes are truncated; the schema
/// validator never lets one through.
fn put_short(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = bytes.len().min(u8::MAX as usize);
    out.push(len as u8);
    out.extend_from_slice(&bytes[..len]);
}

fn put_long(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = bytes.len().min(u32::MAX as usize);
    out.extend_from_slice(&(len as u32).to_be_bytes());
    out.extend_from_slice(&bytes[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZoneDescriptor;
    use rollcall_geo::GeocellCode;
    use rollcall_types::Timestamp;

    fn claim() -> Claim {
        Claim {
            version: 1,
            issuer: "0a".repeat(32),
            event_id: "ev".into(),
            nonce: "n1".into(),
            issued_at: Timestamp::new(0x0102),
            expires_at: Timestamp::new(0x0304),
            zone: ZoneDescriptor {
                cells: vec![GeocellCode::parse("dr5ru").unwrap()],
                tolerance: 1,
            },
            signature: String::new(),
        }
    }

    #[test]
    fn exact_layout() {
        let c = claim();
        let mut expected = Vec::new();
        expected.extend_from_slice(b"rollcall/claim/v1");
        expected.extend_from_slice(&[0, 1]);
        expected.push(64);
        expected.extend_from_slice("0a".repeat(32).as_bytes());
        expected.extend_from_slice(&[0, 0, 0, 2]);
        expected.extend_from_slice(b"ev");
        expected.extend_from_slice(&[0, 0, 0, 2]);
        expected.extend_from_slice(b"n1");
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 2]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 3, 4]);
        expected.push(1);
        expected.extend_from_slice(&[0, 1]);
        expected.push(5);
        expected.extend_from_slice(b"dr5ru");
        assert_eq!(signing_message(&c), expected);
    }

    #[test]
    fn every_field_is_covered() {
        let base = signing_message(&claim());
        let mutations: Vec<Box<dyn Fn(&mut Claim)>> = vec![
            Box::new(|c| c.version = 2),
            Box::new(|c| c.issuer = "0b".repeat(32)),
            Box::new(|c| c.event_id = "ew".into()),
            Box::new(|c| c.nonce = "n2".into()),
            Box::new(|c| c.issued_at = Timestamp::new(0x0103)),
            Box::new(|c| c.expires_at = Timestamp::new(0x0305)),
            Box::new(|c| c.zone.tolerance = 0),
            Box::new(|c| c.zone.cells = vec![GeocellCode::parse("dr5rv").unwrap()]),
        ];
        for mutate in mutations {
            let mut c = claim();
            mutate(&mut c);
            assert_ne!(signing_message(&c), base);
        }
    }

    #[test]
    fn framing_prevents_field_shifting() {
        // "ev"+"n1" must not encode the same as "evn"+"1".
        let mut shifted = claim();
        shifted.event_id = "evn".into();
        shifted.nonce = "1".into();
        assert_ne!(signing_message(&shifted), signing_message(&claim()));
    }
}
