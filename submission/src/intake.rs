//! Hand-off from verification to submission.

use tracing::debug;

use rollcall_claims::Claim;
use rollcall_store::{ClaimRef, QueueStore};
use rollcall_types::{ItemId, Timestamp};

use crate::envelope::UnsignedEnvelope;
use crate::queue::SubmissionQueue;
use crate::signer::{sign_envelope, TransactionSigner};
use crate::IntakeError;

/// The privacy-preserving reference kept for a verified claim. Geocell codes
/// are replaced by their digests here.
pub fn claim_ref(claim: &Claim) -> ClaimRef {
    ClaimRef {
        digest: claim.digest(),
        event_id: claim.event_id.clone(),
        issuer: claim.issuer.clone(),
        nonce: claim.nonce_digest(),
        zones: claim.zone.digests(),
    }
}

/// Build, sign and queue the transaction for an accepted claim.
///
/// Nothing is queued if the user cancels signing.
pub async fn enqueue_verified<S, Q>(
    queue: &SubmissionQueue<Q>,
    signer: &S,
    claim: &Claim,
    validity_secs: u64,
    now: Timestamp,
) -> Result<ItemId, IntakeError>
where
    S: TransactionSigner,
    Q: QueueStore,
{
    let reference = claim_ref(claim);
    let body = UnsignedEnvelope::for_claim(&reference, now, validity_secs);
    let envelope = sign_envelope(signer, body).await?;
    debug!(claim = %reference.digest, "envelope signed");
    Ok(queue.enqueue(reference, &envelope, now)?)
}
