use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::trace;

use super::TokenClient;
use super::key::TokenKey;
use crate::digest::SignAlgorithm;

/// In-process token for deployments without an HSM.
///
/// The key set and the batch signing flag are fixed at construction.
pub struct SoftwareToken {
    batch_signing_enabled: bool,
    keys: HashMap<String, Arc<dyn TokenKey>>,
}

impl SoftwareToken {
    pub fn new(batch_signing_enabled: bool) -> Self {
        Self {
            batch_signing_enabled,
            keys: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key_id: impl Into<String>, key: impl TokenKey + 'static) -> Self {
        self.keys.insert(key_id.into(), Arc::new(key));
        self
    }

    pub fn public_key_bytes(&self, key_id: &str) -> Option<Vec<u8>> {
        self.keys.get(key_id).map(|key| key.public_key_bytes())
    }

    fn key(&self, key_id: &str) -> Result<&Arc<dyn TokenKey>> {
        self.keys
            .get(key_id)
            .ok_or_else(|| anyhow!("key '{key_id}' not found in software token"))
    }
}

impl TokenClient for SoftwareToken {
    fn is_batch_signing_enabled(&self, key_id: &str) -> Result<bool> {
        self.key(key_id)?;
        Ok(self.batch_signing_enabled)
    }

    fn sign(&self, key_id: &str, algorithm: SignAlgorithm, digest: &[u8]) -> Result<Vec<u8>> {
        trace!("software token signing with key '{key_id}' ({algorithm})");
        let key = self.key(key_id)?;
        if digest.len() != algorithm.digest().output_len() {
            bail!(
                "digest length {} does not match {algorithm} ({} bytes)",
                digest.len(),
                algorithm.digest().output_len()
            );
        }
        key.sign_digest(algorithm, digest)
    }
}
