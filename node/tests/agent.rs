//! Agent wiring over LMDB with in-memory collaborators.

use std::sync::Arc;

use rollcall_node::{Agent, AgentConfig};
use rollcall_nullables::{ClaimIssuer, NullClock, NullLocation, NullRelay, NullSigner};
use rollcall_submission::{
    Finalization, IntakeError, ItemStatus, RelayError, SignError, TransactionEnvelope,
    TransactionSigner,
};
use rollcall_types::{SubmissionParams, VerificationParams};
use rollcall_verification::{ReplayStatus, Verdict, VerificationError};
use tempfile::TempDir;
use tokio::sync::watch;

const T: u64 = 1_700_000_000;
const EMPIRE_STATE: (f64, f64) = (40.7484, -73.9857);

struct Harness {
    _dir: TempDir,
    issuer: ClaimIssuer,
    clock: Arc<NullClock>,
    relay: Arc<NullRelay>,
    signer: Arc<NullSigner>,
    agent: Agent<NullRelay, NullSigner>,
}

fn config(dir: &TempDir, issuer: &ClaimIssuer) -> AgentConfig {
    AgentConfig {
        data_dir: dir.path().to_path_buf(),
        map_size: 16 * 1024 * 1024,
        trusted_issuers: vec![issuer.public_key().to_hex()],
        verification: VerificationParams {
            nonce_capacity: 100,
            ..Default::default()
        },
        submission: SubmissionParams {
            backoff_base_ms: 1_000,
            backoff_max_ms: 4_000,
            max_attempts: 3,
            submit_timeout_ms: 100,
            poll_interval_ms: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let issuer = ClaimIssuer::new(3);
        let clock = Arc::new(NullClock::new(T + 10));
        let relay = Arc::new(NullRelay::new());
        let signer = Arc::new(NullSigner::new(9));
        let agent = Agent::open(
            config(&dir, &issuer),
            Arc::clone(&relay),
            Arc::clone(&signer),
            clock.clone(),
        )
        .unwrap();
        Self {
            _dir: dir,
            issuer,
            clock,
            relay,
            signer,
            agent,
        }
    }

    fn raw(&self, nonce: &str) -> String {
        let claim = self.issuer.claim(nonce, T, T + 900, &["dr5ru"], 0);
        self.issuer.raw(&claim)
    }
}

fn here() -> NullLocation {
    NullLocation::at(EMPIRE_STATE.0, EMPIRE_STATE.1)
}

#[tokio::test]
async fn accepted_scan_is_queued_and_finalized() {
    let h = Harness::new();
    let (tx, rx) = watch::channel(Verdict::checking());

    let outcome = h.agent.scan(&h.raw("n1"), &here(), &tx).await;
    assert!(outcome.verification.verdict.is_accepted());
    assert_eq!(*rx.borrow(), outcome.verification.verdict);
    let id = outcome.queued.unwrap().unwrap();

    let items = h.agent.queue_items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(h.agent.metrics().queue_depth.get(), 1);

    let report = h.agent.drain_once().await.unwrap();
    assert_eq!(report.finalized, 1);
    assert!(h.agent.queue_items().unwrap().is_empty());
    assert_eq!(h.relay.submitted().len(), 1);
    assert_eq!(h.agent.metrics().submissions_finalized.get(), 1);
    assert_eq!(h.agent.metrics().queue_depth.get(), 0);
}

#[tokio::test]
async fn rejected_scan_queues_nothing() {
    let h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());

    assert!(h.agent.scan(&h.raw("n1"), &here(), &tx).await.queued.is_some());
    let replay = h.agent.scan(&h.raw("n1"), &here(), &tx).await;

    assert_eq!(replay.verification.verdict.replay, ReplayStatus::Duplicate);
    assert!(replay.queued.is_none());
    assert_eq!(h.agent.queue_items().unwrap().len(), 1);
    assert_eq!(
        h.agent
            .metrics()
            .claims_rejected
            .with_label_values(&["replay_detected"])
            .get(),
        1
    );
}

#[tokio::test]
async fn cancelled_signing_keeps_the_verdict_but_queues_nothing() {
    let h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());
    h.signer.cancel_next(true);

    let outcome = h.agent.scan(&h.raw("n1"), &here(), &tx).await;
    assert!(outcome.verification.verdict.is_accepted());
    assert!(matches!(
        outcome.queued,
        Some(Err(IntakeError::Sign(SignError::Cancelled)))
    ));
    assert!(h.agent.queue_items().unwrap().is_empty());
}

#[tokio::test]
async fn untrusted_issuer_is_rejected() {
    let h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());
    let stranger = ClaimIssuer::new(4);
    let claim = stranger.claim("n1", T, T + 900, &["dr5ru"], 0);

    let outcome = h.agent.scan(&stranger.raw(&claim), &here(), &tx).await;
    assert_eq!(
        outcome.verification.verdict.rejection,
        Some(VerificationError::InvalidIssuer)
    );
}

#[tokio::test]
async fn failed_item_can_be_retried_and_discarded() {
    let h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());
    let id = h
        .agent
        .scan(&h.raw("n1"), &here(), &tx)
        .await
        .queued
        .unwrap()
        .unwrap();

    for _ in 0..3 {
        h.relay
            .push_submit(Err(RelayError::ServerError("503".into())));
        h.agent.drain_once().await.unwrap();
        h.clock.advance(10);
    }
    let item = &h.agent.queue_items().unwrap()[0];
    assert_eq!(item.status, ItemStatus::Failed);
    assert_eq!(h.agent.metrics().submissions_failed.get(), 1);

    let retried = h.agent.retry(&id).unwrap();
    assert_eq!(retried.status, ItemStatus::Pending);

    h.agent.discard(&id).unwrap();
    assert!(h.agent.queue_items().unwrap().is_empty());
    assert_eq!(h.agent.metrics().queue_depth.get(), 0);
}

#[tokio::test]
async fn expired_signature_is_resigned_on_request() {
    let h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());
    let id = h
        .agent
        .scan(&h.raw("n1"), &here(), &tx)
        .await
        .queued
        .unwrap()
        .unwrap();

    h.relay.push_submit(Err(RelayError::Rejected {
        reason: "signature expired".into(),
        signature_expired: true,
    }));
    h.agent.drain_once().await.unwrap();
    assert_eq!(
        h.agent.queue_items().unwrap()[0].status,
        ItemStatus::NeedsResign
    );

    let signed_before = h.signer.signed();
    let item = h.agent.resign(&id).await.unwrap();
    assert_eq!(item.status, ItemStatus::Pending);
    assert_eq!(h.signer.signed(), signed_before + 1);

    h.agent.drain_once().await.unwrap();
    assert!(h.agent.queue_items().unwrap().is_empty());
}

#[tokio::test]
async fn background_loop_drains_until_stopped() {
    let mut h = Harness::new();
    let (tx, _rx) = watch::channel(Verdict::checking());
    h.relay.push_finalization(Ok(Finalization::Finalized));
    h.agent.scan(&h.raw("n1"), &here(), &tx).await;

    h.agent.start();
    for _ in 0..100 {
        if h.agent.queue_items().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    h.agent.stop().await.unwrap();

    assert!(h.agent.queue_items().unwrap().is_empty());
    assert_eq!(h.relay.submitted().len(), 1);
}

#[tokio::test]
async fn accepted_nonces_and_queue_survive_restart() {
    let dir = TempDir::new().unwrap();
    let issuer = ClaimIssuer::new(3);
    let raw = issuer.raw(&issuer.claim("n1", T, T + 900, &["dr5ru"], 0));
    let (tx, _rx) = watch::channel(Verdict::checking());

    {
        let mut agent = Agent::open(
            config(&dir, &issuer),
            Arc::new(NullRelay::new()),
            Arc::new(NullSigner::new(9)),
            Arc::new(NullClock::new(T + 10)),
        )
        .unwrap();
        assert!(agent.scan(&raw, &here(), &tx).await.verification.verdict.is_accepted());
        agent.stop().await.unwrap();
    }

    let agent = Agent::open(
        config(&dir, &issuer),
        Arc::new(NullRelay::new()),
        Arc::new(NullSigner::new(9)),
        Arc::new(NullClock::new(T + 20)),
    )
    .unwrap();
    assert_eq!(agent.queue_items().unwrap().len(), 1);
    assert_eq!(agent.metrics().queue_depth.get(), 1);

    let replay = agent.scan(&raw, &here(), &tx).await;
    assert_eq!(
        replay.verification.verdict.rejection,
        Some(VerificationError::ReplayDetected)
    );
}

#[tokio::test]
async fn new_device_key_leaves_queued_envelopes_alone() {
    let dir = TempDir::new().unwrap();
    let issuer = ClaimIssuer::new(3);
    let raw = issuer.raw(&issuer.claim("n1", T, T + 900, &["dr5ru"], 0));
    let (tx, _rx) = watch::channel(Verdict::checking());
    let old_signer = Arc::new(NullSigner::new(9));

    {
        let mut agent = Agent::open(
            config(&dir, &issuer),
            Arc::new(NullRelay::new()),
            Arc::clone(&old_signer),
            Arc::new(NullClock::new(T + 10)),
        )
        .unwrap();
        assert!(agent.scan(&raw, &here(), &tx).await.queued.unwrap().is_ok());
        agent.stop().await.unwrap();
    }

    let agent = Agent::open(
        config(&dir, &issuer),
        Arc::new(NullRelay::new()),
        Arc::new(NullSigner::new(10)),
        Arc::new(NullClock::new(T + 20)),
    )
    .unwrap();
    let items = agent.queue_items().unwrap();
    let envelope = TransactionEnvelope::from_bytes(&items[0].envelope).unwrap();
    assert_eq!(envelope.signer, old_signer.public_key());
    assert!(envelope.verify());
}

#[test]
fn bad_issuer_key_in_config_fails_open() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &ClaimIssuer::new(3));
    config.trusted_issuers.push("not hex".into());
    let result = Agent::open(
        config,
        Arc::new(NullRelay::new()),
        Arc::new(NullSigner::new(9)),
        Arc::new(NullClock::new(T)),
    );
    assert!(result.is_err());
}
