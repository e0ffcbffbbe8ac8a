//! One worker per signing certificate.
//!
//! A worker owns the queue of requests for its certificate and a task that
//! drains it. When the token allows batch signing, everything that is queued
//! when the task wakes up is signed with a single token call through a hash
//! chain; otherwise requests are signed one by one. Either way the outcome of
//! the token call is shared by every request of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::digest::SignAlgorithm;
use crate::error::SignerError;
use crate::request::{SignatureData, SigningRequest};
use crate::signing::SigningContext;
use crate::token::TokenClient;

pub type SignResult = Result<SignatureData, SignerError>;

/// A caller's request while it waits in a worker queue.
pub struct PendingSignRequest {
    created_at: Instant,
    key_id: String,
    algorithm: SignAlgorithm,
    request: SigningRequest,
    responder: oneshot::Sender<SignResult>,
}

impl PendingSignRequest {
    pub fn new(
        key_id: impl Into<String>,
        algorithm: SignAlgorithm,
        request: SigningRequest,
    ) -> (Self, oneshot::Receiver<SignResult>) {
        let (responder, receiver) = oneshot::channel();
        let pending = Self {
            created_at: Instant::now(),
            key_id: key_id.into(),
            algorithm,
            request,
            responder,
        };
        (pending, receiver)
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.created_at.elapsed() > timeout
    }

    /// Completes the caller's handle. A caller that already gave up is fine.
    fn resolve(self, result: SignResult) {
        if self.responder.send(result).is_err() {
            trace!("caller stopped waiting before the result was ready");
        }
    }

    #[cfg(test)]
    pub(crate) fn created_at(mut self, created_at: Instant) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Handle to the task that signs everything for one certificate.
pub struct CertificateWorker {
    queue: mpsc::UnboundedSender<PendingSignRequest>,
    stop: CancellationToken,
}

impl CertificateWorker {
    /// Queries the token for the batch signing flag of `key_id` on the
    /// blocking pool, then starts the worker.
    pub async fn start(
        name: impl Into<String>,
        key_id: &str,
        token: Arc<dyn TokenClient>,
        timeout: Duration,
    ) -> Result<Self, SignerError> {
        let query_token = Arc::clone(&token);
        let query_key = key_id.to_string();
        let batch_signing_enabled =
            tokio::task::spawn_blocking(move || query_token.is_batch_signing_enabled(&query_key))
                .await
                .map_err(|e| SignerError::Internal(format!("batch signing query failed: {e}")))?
                .map_err(|e| {
                    error!("Failed to query if batch signing is enabled for token with key {key_id}: {e:#}");
                    SignerError::signing(e)
                })?;

        Self::spawn(name, batch_signing_enabled, token, timeout)
    }

    /// Starts the worker task on the current tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        batch_signing_enabled: bool,
        token: Arc<dyn TokenClient>,
        timeout: Duration,
    ) -> Result<Self, SignerError> {
        let name = name.into();
        let runtime = Handle::try_current()
            .map_err(|e| SignerError::Internal(format!("no tokio runtime for worker: {e}")))?;

        let (queue, requests) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();

        info!("Starting worker for cert '{name}' (batch signing enabled: {batch_signing_enabled})");

        let worker_loop = WorkerLoop {
            name,
            batch_signing_enabled,
            timeout,
            token,
            requests,
            stop: stop.clone(),
        };
        runtime.spawn(worker_loop.run());

        Ok(Self { queue, stop })
    }

    /// Queues a request without waiting. A request reaching a stopped worker
    /// is answered with [`SignerError::WorkerStopped`].
    pub fn handle_sign_request(&self, pending: PendingSignRequest) {
        trace!("handle_sign_request()");
        if let Err(mpsc::error::SendError(pending)) = self.queue.send(pending) {
            pending.resolve(Err(SignerError::WorkerStopped));
        }
    }

    /// Asks the task to exit. A batch already at the token is allowed to
    /// finish.
    pub fn stop(&self) {
        trace!("stop()");
        self.stop.cancel();
    }
}

struct WorkerLoop {
    name: String,
    batch_signing_enabled: bool,
    timeout: Duration,
    token: Arc<dyn TokenClient>,
    requests: mpsc::UnboundedReceiver<PendingSignRequest>,
    stop: CancellationToken,
}

impl WorkerLoop {
    async fn run(mut self) {
        while let Some(batch) = self.next_batch().await {
            self.sign(batch).await;
        }
        info!("Worker for cert '{}' stopped", self.name);
    }

    /// Waits for the first live request, then drains whatever else is
    /// already queued when batching is on. Returns `None` once stopped.
    async fn next_batch(&mut self) -> Option<Vec<PendingSignRequest>> {
        trace!("polling queue");

        let first = loop {
            let pending = tokio::select! {
                biased;
                _ = self.stop.cancelled() => return None,
                next = self.requests.recv() => match next {
                    Some(pending) => pending,
                    None => return None,
                },
            };
            if pending.is_expired(self.timeout) {
                self.reject_expired(pending);
                continue;
            }
            break pending;
        };

        let mut batch = vec![first];
        if self.batch_signing_enabled {
            while let Ok(pending) = self.requests.try_recv() {
                batch.push(pending);
            }
        }

        let (admitted, expired): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .partition(|pending| !pending.is_expired(self.timeout));
        for pending in expired {
            self.reject_expired(pending);
        }

        Some(admitted)
    }

    fn reject_expired(&self, pending: PendingSignRequest) {
        warn!(
            "Dropping sign request for cert '{}' queued {:?} ago",
            self.name,
            pending.created_at.elapsed()
        );
        pending.resolve(Err(SignerError::Timeout));
    }

    async fn sign(&self, batch: Vec<PendingSignRequest>) {
        debug!("processing {} sign requests", batch.len());

        let Some(first) = batch.first() else {
            return;
        };
        let mut ctx = SigningContext::new(first.key_id.clone(), first.algorithm);
        let mut responders = Vec::with_capacity(batch.len());
        let mut admission = Ok(());
        for pending in batch {
            responders.push(pending.responder);
            admission = admission.and_then(|_| ctx.add(pending.request));
        }

        let outcome = match admission {
            Ok(()) => self.sign_context(ctx).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(signatures) if signatures.len() == responders.len() => {
                for (responder, signature) in responders.into_iter().zip(signatures) {
                    if responder.send(Ok(signature)).is_err() {
                        trace!("future was completed already");
                    }
                }
            }
            Ok(signatures) => {
                let error = SignerError::Internal(format!(
                    "rendered {} signatures for {} requests",
                    signatures.len(),
                    responders.len()
                ));
                Self::send_error(responders, error);
            }
            Err(error) => {
                error!("Signing batch for cert '{}' failed: {error}", self.name);
                Self::send_error(responders, error);
            }
        }
    }

    async fn sign_context(&self, mut ctx: SigningContext) -> Result<Vec<SignatureData>, SignerError> {
        let digest = ctx.digest_to_be_signed()?;

        let token = Arc::clone(&self.token);
        let key_id = ctx.key_id().to_string();
        let algorithm = ctx.algorithm();
        let signature = tokio::task::spawn_blocking(move || token.sign(&key_id, algorithm, &digest))
            .await
            .map_err(|e| SignerError::Internal(format!("signing task failed: {e}")))?
            .map_err(SignerError::signing)?;

        ctx.create_signature_data(&signature)
    }

    fn send_error(responders: Vec<oneshot::Sender<SignResult>>, error: SignerError) {
        for responder in responders {
            if responder.send(Err(error.clone())).is_err() {
                trace!("future was completed already");
            }
        }
    }
}
