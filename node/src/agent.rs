//! The agent: wires storage, verification and submission together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Instrument};

use rollcall_geo::LocationProvider;
use rollcall_store::MetaStore;
use rollcall_store_lmdb::{LmdbEnvironment, LmdbNonceStore, LmdbQueueStore};
use rollcall_submission::{
    enqueue_verified, sign_envelope, DrainReport, IntakeError, LedgerRelay, QueueItem,
    SubmissionQueue, SubmissionWorker, TransactionSigner, UnsignedEnvelope,
};
use rollcall_types::{Clock, ItemId};
use rollcall_verification::{
    IssuerRegistry, NonceLedger, StaticIssuers, Verdict, Verification, VerificationOrchestrator,
};

use crate::tracing_spans::{drain_span, submit_span, verify_span};
use crate::{AgentConfig, AgentMetrics, NodeError, ShutdownController};

/// Everything a scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub verification: Verification,
    /// Set only for accepted claims: the queue item, or why none was created
    /// (for example the user cancelled signing).
    pub queued: Option<Result<ItemId, IntakeError>>,
}

/// A running Rollcall agent.
pub struct Agent<R, T> {
    config: AgentConfig,
    env: LmdbEnvironment,
    issuers: Arc<dyn IssuerRegistry>,
    verifier: VerificationOrchestrator<LmdbNonceStore>,
    queue: Arc<SubmissionQueue<LmdbQueueStore>>,
    worker: Arc<SubmissionWorker<LmdbQueueStore, R>>,
    signer: Arc<T>,
    clock: Arc<dyn Clock>,
    metrics: Arc<AgentMetrics>,
    shutdown: Arc<ShutdownController>,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl<R, T> Agent<R, T>
where
    R: LedgerRelay + 'static,
    T: TransactionSigner,
{
    /// Open the agent's storage and prepare every subsystem.
    ///
    /// Call [`start`](Self::start) to begin draining the submission queue.
    pub fn open(
        config: AgentConfig,
        relay: Arc<R>,
        signer: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
        let signer_key = signer.public_key();
        if let Some(previous) = env.meta_store().replace_signer_key(&signer_key)? {
            warn!(
                %previous,
                current = %signer_key,
                "device signing key changed; queued envelopes keep their original signer"
            );
        }

        let ledger = NonceLedger::open(
            Arc::new(env.nonce_store()),
            config.verification.nonce_capacity,
        )?;
        let verifier = VerificationOrchestrator::new(Arc::new(ledger), config.verification.clone());
        let issuers = StaticIssuers::from_hex(&config.trusted_issuers)?;

        let queue = Arc::new(SubmissionQueue::new(Arc::new(env.queue_store())));
        let worker = Arc::new(SubmissionWorker::new(
            Arc::clone(&queue),
            relay,
            Arc::clone(&clock),
            config.submission.clone(),
        ));

        let metrics = AgentMetrics::new()?;
        let depth = queue.depth()?;
        metrics.queue_depth.set(depth as i64);

        info!(
            data_dir = %config.data_dir.display(),
            issuers = config.trusted_issuers.len(),
            nonces = verifier.ledger().len(),
            queued = depth,
            "agent opened"
        );

        Ok(Self {
            config,
            env,
            issuers: Arc::new(issuers),
            verifier,
            queue,
            worker,
            signer,
            clock,
            metrics: Arc::new(metrics),
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    /// Replace the trusted issuer source. Takes effect on the next scan.
    pub fn set_issuers(&mut self, issuers: Arc<dyn IssuerRegistry>) {
        self.issuers = issuers;
    }

    /// Verify a scanned payload and, if accepted, sign and queue its
    /// transaction. Intermediate verdicts are published on `updates`.
    pub async fn scan<P: LocationProvider>(
        &self,
        raw: &str,
        location: &P,
        updates: &watch::Sender<Verdict>,
    ) -> ScanOutcome {
        let started = Instant::now();
        let now = self.clock.now();
        let trusted = self.issuers.snapshot();
        let timeout = Duration::from_millis(self.config.verification.location_timeout_ms);

        let verification = self
            .verifier
            .verify(raw, &trusted, now, location, timeout, updates)
            .instrument(verify_span(raw.len()))
            .await;
        self.metrics
            .record_verdict(&verification.verdict, started.elapsed());

        let Some(claim) = verification.accepted_claim().cloned() else {
            if let Some(rejection) = &verification.verdict.rejection {
                warn!(reason = rejection.code(), "claim rejected");
            }
            return ScanOutcome {
                verification,
                queued: None,
            };
        };

        let queued = enqueue_verified(
            &self.queue,
            self.signer.as_ref(),
            &claim,
            self.config.submission.envelope_validity_secs,
            now,
        )
        .instrument(submit_span(&claim.digest().to_hex()))
        .await;

        match &queued {
            Ok(id) => info!(item = %id, "accepted claim queued for submission"),
            Err(e) => warn!(claim = %claim.digest(), error = %e, "accepted claim not queued"),
        }
        self.refresh_depth();

        ScanOutcome {
            verification,
            queued: Some(queued),
        }
    }

    /// Run one drain pass now, outside the background loop.
    pub async fn drain_once(&self) -> Result<DrainReport, NodeError> {
        drain_and_record(&self.worker, &self.metrics).await
    }

    /// Spawn the background submission loop.
    pub fn start(&mut self) {
        let worker = Arc::clone(&self.worker);
        let metrics = Arc::clone(&self.metrics);
        let mut shutdown = self.shutdown.subscribe();
        let period = Duration::from_millis(self.config.submission.poll_interval_ms.max(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => {
                        info!("submission worker shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = drain_and_record(&worker, &metrics).await {
                            warn!(error = %e, "submission drain failed");
                        }
                    }
                }
            }
        });
        self.task_handles.push(handle);
        info!(poll_ms = period.as_millis() as u64, "submission worker started");
    }

    /// Stop background work and flush storage.
    ///
    /// A drain pass already running is allowed to finish.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        info!("agent stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        self.verifier.ledger().close();
        self.env.sync()?;
        info!("agent stopped");
        Ok(())
    }

    /// Every queued item, oldest first.
    pub fn queue_items(&self) -> Result<Vec<QueueItem>, NodeError> {
        Ok(self.queue.list()?)
    }

    /// Put a failed item back into the automatic retry cycle.
    pub fn retry(&self, id: &ItemId) -> Result<QueueItem, NodeError> {
        Ok(self.queue.retry(id, self.clock.now())?)
    }

    /// Drop an item for good.
    pub fn discard(&self, id: &ItemId) -> Result<QueueItem, NodeError> {
        let item = self.queue.discard(id)?;
        self.refresh_depth();
        Ok(item)
    }

    /// Sign a fresh envelope for an item whose signature expired.
    pub async fn resign(&self, id: &ItemId) -> Result<QueueItem, NodeError> {
        let item = self.queue.get(id)?;
        let now = self.clock.now();
        let body = UnsignedEnvelope::for_claim(
            &item.claim,
            now,
            self.config.submission.envelope_validity_secs,
        );
        let envelope = sign_envelope(self.signer.as_ref(), body).await?;
        Ok(self.queue.resign(id, &envelope, now)?)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> &Arc<ShutdownController> {
        &self.shutdown
    }

    fn refresh_depth(&self) {
        match self.queue.depth() {
            Ok(depth) => self.metrics.queue_depth.set(depth as i64),
            Err(e) => warn!(error = %e, "could not read queue depth"),
        }
    }
}

async fn drain_and_record<R: LedgerRelay>(
    worker: &SubmissionWorker<LmdbQueueStore, R>,
    metrics: &AgentMetrics,
) -> Result<DrainReport, NodeError> {
    let depth = worker.queue().depth()?;
    let report = worker.drain_due().instrument(drain_span(depth)).await?;
    metrics.record_drain(&report);
    metrics.queue_depth.set(worker.queue().depth()? as i64);
    Ok(report)
}
