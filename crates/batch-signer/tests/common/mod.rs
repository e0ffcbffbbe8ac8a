#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use batch_signer::{
    BatchSigner, BatchSignerConfig, Certificate, DigestAlgorithm, MessagePart, SignAlgorithm,
    SigningRequest, TokenClient,
};

pub const KEY_ID: &str = "key-1";

/// Records every call and echoes the digest back as the signature.
pub struct MockToken {
    batch_signing_enabled: bool,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    query_delays: Mutex<HashMap<String, Duration>>,
    batch_queries: AtomicUsize,
    sign_calls: Mutex<Vec<(String, SignAlgorithm, Vec<u8>)>>,
}

impl MockToken {
    pub fn new(batch_signing_enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            batch_signing_enabled,
            fail: AtomicBool::new(false),
            delay: Mutex::new(None),
            query_delays: Mutex::new(HashMap::new()),
            batch_queries: AtomicUsize::new(0),
            sign_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Makes the batch flag query for `key_id` block for `delay`.
    pub fn stall_batch_query(&self, key_id: &str, delay: Duration) {
        self.query_delays
            .lock()
            .unwrap()
            .insert(key_id.to_string(), delay);
    }

    pub fn batch_queries(&self) -> usize {
        self.batch_queries.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> Vec<(String, SignAlgorithm, Vec<u8>)> {
        self.sign_calls.lock().unwrap().clone()
    }
}

impl TokenClient for MockToken {
    fn is_batch_signing_enabled(&self, key_id: &str) -> anyhow::Result<bool> {
        let delay = self.query_delays.lock().unwrap().get(key_id).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.batch_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.batch_signing_enabled)
    }

    fn sign(&self, key_id: &str, algorithm: SignAlgorithm, digest: &[u8]) -> anyhow::Result<Vec<u8>> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.sign_calls
            .lock()
            .unwrap()
            .push((key_id.to_string(), algorithm, digest.to_vec()));
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("HSM unavailable");
        }
        Ok(digest.to_vec())
    }
}

pub fn signer(token: Arc<MockToken>, timeout: Duration) -> BatchSigner {
    BatchSigner::new(token, BatchSignerConfig::new(timeout))
}

pub fn certificate(name: &str) -> Certificate {
    Certificate::from_der(format!("DER:{name}").into_bytes())
}

pub fn message_request(cert: &str, message: &str) -> SigningRequest {
    SigningRequest::new(
        certificate(cert),
        vec![MessagePart::message("/message", DigestAlgorithm::Sha256, message.as_bytes().to_vec())],
    )
}
