use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::BatchSignerConfig;
use crate::digest::SignAlgorithm;
use crate::error::SignerError;
use crate::request::{SignatureData, SigningRequest};
use crate::token::TokenClient;
use crate::worker::{CertificateWorker, PendingSignRequest};

/// Routes sign requests to one worker per signing certificate and waits for
/// the outcome.
///
/// Workers are created lazily the first time a certificate is seen and live
/// until [`BatchSigner::shutdown`]. The registry lock is only held to fetch a
/// certificate's slot; the token is queried outside of it.
pub struct BatchSigner {
    token: Arc<dyn TokenClient>,
    config: BatchSignerConfig,
    workers: DashMap<String, Arc<OnceCell<CertificateWorker>>>,
    running: AtomicBool,
}

impl BatchSigner {
    pub fn new(token: Arc<dyn TokenClient>, config: BatchSignerConfig) -> Self {
        info!("Batch signer started (client timeout {:?})", config.timeout());
        Self {
            token,
            config,
            workers: DashMap::new(),
            running: AtomicBool::new(true),
        }
    }

    /// Builds a signer with its timeout read from the environment.
    pub fn from_env(token: Arc<dyn TokenClient>) -> anyhow::Result<Self> {
        Ok(Self::new(token, BatchSignerConfig::from_env()?))
    }

    pub fn config(&self) -> &BatchSignerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of certificates that currently have a worker.
    pub fn worker_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    /// Signs `request` with the key `key_id`.
    ///
    /// The request is queued on the worker of its signing certificate and
    /// may be signed together with other requests queued for the same
    /// certificate. The whole call, including starting the worker on first
    /// use of a certificate, waits at most the configured client timeout.
    pub async fn sign(
        &self,
        key_id: &str,
        algorithm: SignAlgorithm,
        request: SigningRequest,
    ) -> Result<SignatureData, SignerError> {
        trace!("sign({key_id}, {algorithm})");
        if !self.is_running() {
            return Err(SignerError::Uninitialized);
        }

        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let name = request.signing_cert().hex_hash();

        let slot = Arc::clone(self.workers.entry(name.clone()).or_default().value());
        let worker = tokio::time::timeout_at(
            deadline,
            slot.get_or_try_init(|| {
                CertificateWorker::start(name.clone(), key_id, Arc::clone(&self.token), timeout)
            }),
        )
        .await
        .map_err(|_| {
            warn!("Starting worker for cert '{name}' took longer than {timeout:?}");
            SignerError::Timeout
        })??;

        // shutdown may have cleared the registry while the worker was starting
        if !self.is_running() {
            worker.stop();
            return Err(SignerError::Uninitialized);
        }

        let (pending, receiver) = PendingSignRequest::new(key_id, algorithm, request);
        worker.handle_sign_request(pending);

        match tokio::time::timeout_at(deadline, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                debug!("worker for cert '{name}' dropped the request");
                Err(SignerError::WorkerStopped)
            }
            Err(_) => {
                warn!("Sign request for cert '{name}' timed out after {timeout:?}");
                Err(SignerError::Timeout)
            }
        }
    }

    /// Stops every worker. Later calls to [`BatchSigner::sign`] fail with
    /// [`SignerError::Uninitialized`].
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        for slot in self.workers.iter() {
            if let Some(worker) = slot.value().get() {
                worker.stop();
            }
        }
        self.workers.clear();
        info!("Batch signer stopped");
    }
}

impl Drop for BatchSigner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
