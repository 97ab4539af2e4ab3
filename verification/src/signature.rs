use rollcall_claims::Claim;
use rollcall_crypto::verify_signature;
use rollcall_types::Signature;

use crate::{TrustedIssuers, VerificationError};

/// Check that a trusted issuer signed exactly this claim's fields.
///
/// An untrusted issuer is reported before any cryptography runs. Key or
/// signature material that does not decode counts as an invalid signature.
pub fn verify_claim_signature(
    claim: &Claim,
    trusted: &TrustedIssuers,
) -> Result<(), VerificationError> {
    let issuer = trusted
        .get(&claim.issuer)
        .ok_or(VerificationError::InvalidIssuer)?;
    let signature =
        Signature::from_hex(&claim.signature).map_err(|_| VerificationError::InvalidSignature)?;

    if verify_signature(&claim.signing_message(), &signature, issuer) {
        Ok(())
    } else {
        Err(VerificationError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_nullables::ClaimIssuer;

    fn trusted(issuer: &ClaimIssuer) -> TrustedIssuers {
        TrustedIssuers::new([issuer.public_key()])
    }

    #[test]
    fn genuine_claim_verifies() {
        let issuer = ClaimIssuer::new(1);
        let claim = issuer.claim("n1", 100, 1_000, &["dr5ru"], 0);
        assert_eq!(verify_claim_signature(&claim, &trusted(&issuer)), Ok(()));
    }

    #[test]
    fn unknown_issuer_checked_first() {
        let issuer = ClaimIssuer::new(1);
        let mut claim = issuer.claim("n1", 100, 1_000, &["dr5ru"], 0);
        claim.signature = "zz".into();
        let other = TrustedIssuers::new([ClaimIssuer::new(2).public_key()]);
        assert_eq!(
            verify_claim_signature(&claim, &other),
            Err(VerificationError::InvalidIssuer)
        );
    }

    #[test]
    fn flipped_signature_byte_fails() {
        let issuer = ClaimIssuer::new(1);
        let mut claim = issuer.claim("n1", 100, 1_000, &["dr5ru"], 0);
        let mut bytes = Signature::from_hex(&claim.signature).unwrap().0;
        bytes[0] ^= 0x01;
        claim.signature = Signature(bytes).to_hex();
        assert_eq!(
            verify_claim_signature(&claim, &trusted(&issuer)),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_field_fails() {
        let issuer = ClaimIssuer::new(1);
        let mut claim = issuer.claim("n1", 100, 1_000, &["dr5ru"], 0);
        claim.zone.tolerance = 1;
        assert_eq!(
            verify_claim_signature(&claim, &trusted(&issuer)),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn undecodable_signature_is_invalid_not_panic() {
        let issuer = ClaimIssuer::new(1);
        let mut claim = issuer.claim("n1", 100, 1_000, &["dr5ru"], 0);
        claim.signature = "00".into();
        assert_eq!(
            verify_claim_signature(&claim, &trusted(&issuer)),
            Err(VerificationError::InvalidSignature)
        );
    }
}
