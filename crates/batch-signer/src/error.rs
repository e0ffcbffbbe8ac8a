use std::sync::Arc;

use crate::hashchain::HashChainError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    #[error("Batch signer is not initialized")]
    Uninitialized,
    #[error("Signature creation timed out")]
    Timeout,
    #[error("Certificate worker has stopped")]
    WorkerStopped,
    #[error("No requests in signing context")]
    EmptyContext,
    #[error("Signing context is frozen, no more requests can be added")]
    ContextFrozen,
    #[error("Unknown signature algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Hash chain error: {0}")]
    HashChain(#[from] HashChainError),
    #[error("Error occurred during signing: {0:#}")]
    Signing(Arc<anyhow::Error>),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignerError {
    /// Stable error code handed to callers across process boundaries.
    pub fn code(&self) -> &'static str {
        match self {
            SignerError::Uninitialized => "uninitialized",
            SignerError::Timeout => "timeout",
            SignerError::UnknownAlgorithm(_) => "invalid_algorithm",
            SignerError::Signing(_) => "signing_failed",
            SignerError::WorkerStopped
            | SignerError::EmptyContext
            | SignerError::ContextFrozen
            | SignerError::HashChain(_)
            | SignerError::Internal(_) => "internal_error",
        }
    }

    pub fn signing(error: anyhow::Error) -> Self {
        Self::Signing(Arc::new(error))
    }
}

impl From<anyhow::Error> for SignerError {
    fn from(error: anyhow::Error) -> Self {
        Self::signing(error)
    }
}
