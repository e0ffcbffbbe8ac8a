mod key;
mod rsa;
mod secp256k1;
mod software;

pub use key::TokenKey;
pub use secp256k1::Secp256k1Key;
pub use self::rsa::RsaKey;
pub use software::SoftwareToken;

use crate::digest::SignAlgorithm;

/// The security module holding the signing keys.
///
/// Implementations are sync, like the PKCS#11 calls behind them. The engine
/// runs them on the blocking thread pool.
pub trait TokenClient: Send + Sync {
    /// Whether the token holding `key_id` allows several requests to share
    /// one signature.
    fn is_batch_signing_enabled(&self, key_id: &str) -> anyhow::Result<bool>;

    /// Signs a precomputed digest. Returns raw signature bytes.
    fn sign(&self, key_id: &str, algorithm: SignAlgorithm, digest: &[u8]) -> anyhow::Result<Vec<u8>>;
}
