//! Claim schema validation.
//!
//! Scanned text is untrusted. [`parse_claim`] bounds its size, parses it as
//! JSON and checks every field, collecting all problems rather than stopping
//! at the first, before anything cryptographic runs.

use serde_json::{Map, Value};

use rollcall_geo::GeocellCode;
use rollcall_types::{Timestamp, VerificationParams};

use crate::claim::{Claim, ZoneDescriptor, CLAIM_VERSION, MAX_ZONE_CELLS};
use crate::error::{ClaimError, FieldError, FieldProblem};

const ISSUER_HEX_LEN: usize = 64;
const SIGNATURE_HEX_LEN: usize = 128;
const MAX_EVENT_ID_LEN: usize = 128;
const MAX_NONCE_LEN: usize = 128;

const CLAIM_FIELDS: &[&str] = &[
    "version",
    "issuer",
    "event_id",
    "nonce",
    "issued_at",
    "expires_at",
    "zone",
    "signature",
];
const ZONE_FIELDS: &[&str] = &["cells", "tolerance"];

/// Parse and validate a scanned claim.
pub fn parse_claim(raw: &str, params: &VerificationParams) -> Result<Claim, ClaimError> {
    if raw.len() > params.max_payload_bytes {
        return Err(ClaimError::PayloadTooLarge {
            size: raw.len(),
            max: params.max_payload_bytes,
        });
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| ClaimError::MalformedPayload(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ClaimError::MalformedPayload("expected a JSON object".into()));
    };

    let mut fields = Fields::new(&map, "");
    fields.reject_unknown(CLAIM_FIELDS);

    let version = fields.uint("version").and_then(|v| {
        if v == u64::from(CLAIM_VERSION) {
            Some(CLAIM_VERSION)
        } else {
            fields.fail("version", FieldProblem::Invalid(format!("unsupported version {v}")));
            None
        }
    });
    let issuer = fields.hex("issuer", ISSUER_HEX_LEN);
    let event_id = fields.bounded_str("event_id", 1, MAX_EVENT_ID_LEN);
    let nonce = fields.bounded_str("nonce", params.min_nonce_len, MAX_NONCE_LEN);
    let issued_at = fields.uint("issued_at").map(Timestamp::new);
    let expires_at = fields.uint("expires_at").map(Timestamp::new);
    if let (Some(iat), Some(exp)) = (issued_at, expires_at) {
        if exp <= iat {
            fields.fail(
                "expires_at",
                FieldProblem::Invalid("must be later than issued_at".into()),
            );
        }
    }
    let zone = fields.object("zone").and_then(|z| {
        let mut nested = Fields::new(z, "zone.");
        let zone = parse_zone(&mut nested);
        fields.errors.append(&mut nested.errors);
        zone
    });
    let signature = fields.hex("signature", SIGNATURE_HEX_LEN);

    match (version, issuer, event_id, nonce, issued_at, expires_at, zone, signature) {
        (
            Some(version),
            Some(issuer),
            Some(event_id),
            Some(nonce),
            Some(issued_at),
            Some(expires_at),
            Some(zone),
            Some(signature),
        ) if fields.errors.is_empty() => Ok(Claim {
            version,
            issuer,
            event_id,
            nonce,
            issued_at,
            expires_at,
            zone,
            signature,
        }),
        _ => Err(ClaimError::SchemaViolation(fields.errors)),
    }
}

fn parse_zone(fields: &mut Fields<'_>) -> Option<ZoneDescriptor> {
    fields.reject_unknown(ZONE_FIELDS);

    let cells = fields.array("cells").and_then(|items| {
        if items.is_empty() || items.len() > MAX_ZONE_CELLS {
            fields.fail(
                "cells",
                FieldProblem::Length {
                    min: 1,
                    max: MAX_ZONE_CELLS,
                    actual: items.len(),
                },
            );
            return None;
        }
        let mut cells = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let name = format!("cells[{i}]");
            match item.as_str() {
                Some(s) => match GeocellCode::parse(s) {
                    Ok(code) => cells.push(code),
                    Err(e) => {
                        fields.fail(&name, FieldProblem::Invalid(e.to_string()));
                        ok = false;
                    }
                },
                None => {
                    fields.fail(&name, FieldProblem::WrongType { expected: "string" });
                    ok = false;
                }
            }
        }
        ok.then_some(cells)
    });

    let tolerance = fields.uint("tolerance").and_then(|t| match u8::try_from(t) {
        Ok(t) => Some(t),
        Err(_) => {
            fields.fail("tolerance", FieldProblem::Invalid(format!("{t} is too large")));
            None
        }
    });

    let (cells, tolerance) = (cells?, tolerance?);
    let shortest = cells.iter().map(GeocellCode::precision).min().unwrap_or(0);
    if usize::from(tolerance) >= shortest {
        fields.fail(
            "tolerance",
            FieldProblem::Invalid(format!(
                "must be less than the shortest cell length {shortest}"
            )),
        );
        return None;
    }
    Some(ZoneDescriptor { cells, tolerance })
}

/// Field accessor that records a [`FieldError`] for every missing or mistyped
/// field instead of returning early.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: &'static str,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, prefix: &'static str) -> Self {
        Self {
            map,
            prefix,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, name: &str, problem: FieldProblem) {
        self.errors
            .push(FieldError::new(format!("{}{name}", self.prefix), problem));
    }

    fn reject_unknown(&mut self, known: &[&str]) {
        let unknown: Vec<String> = self
            .map
            .keys()
            .filter(|k| !known.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in unknown {
            self.fail(&key, FieldProblem::Unexpected);
        }
    }

    fn get(&mut self, name: &str) -> Option<&'a Value> {
        let value = self.map.get(name);
        if value.is_none() {
            self.fail(name, FieldProblem::Missing);
        }
        value
    }

    fn uint(&mut self, name: &str) -> Option<u64> {
        let value = self.get(name)?;
        let n = value.as_u64();
        if n.is_none() {
            self.fail(
                name,
                FieldProblem::WrongType {
                    expected: "non-negative integer",
                },
            );
        }
        n
    }

    fn string(&mut self, name: &str) -> Option<&'a str> {
        let value = self.get(name)?;
        let s = value.as_str();
        if s.is_none() {
            self.fail(name, FieldProblem::WrongType { expected: "string" });
        }
        s
    }

    fn bounded_str(&mut self, name: &str, min: usize, max: usize) -> Option<String> {
        let s = self.string(name)?;
        if s.len() < min || s.len() > max {
            self.fail(
                name,
                FieldProblem::Length {
                    min,
                    max,
                    actual: s.len(),
                },
            );
            return None;
        }
        Some(s.to_string())
    }

    /// Lowercase hex of an exact length. Only the character class is checked;
    /// decoding is left to the signature stage.
    fn hex(&mut self, name: &str, len: usize) -> Option<String> {
        let s = self.bounded_str(name, len, len)?;
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            self.fail(name, FieldProblem::Invalid("expected lowercase hex".into()));
            return None;
        }
        Some(s)
    }

    fn object(&mut self, name: &str) -> Option<&'a Map<String, Value>> {
        let value = self.get(name)?;
        let obj = value.as_object();
        if obj.is_none() {
            self.fail(name, FieldProblem::WrongType { expected: "object" });
        }
        obj
    }

    fn array(&mut self, name: &str) -> Option<&'a Vec<Value>> {
        let value = self.get(name)?;
        let arr = value.as_array();
        if arr.is_none() {
            self.fail(name, FieldProblem::WrongType { expected: "array" });
        }
        arr
    }
}
