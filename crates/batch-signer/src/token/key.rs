use crate::digest::SignAlgorithm;

/// A private key living inside a software token.
pub trait TokenKey: Send + Sync {
    /// Sign a digest produced with `algorithm`'s digest algorithm.
    fn sign_digest(&self, algorithm: SignAlgorithm, digest: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Encoded public key (SEC1 compressed for secp256k1, SPKI DER for RSA).
    fn public_key_bytes(&self) -> Vec<u8>;

    fn supports(&self, algorithm: SignAlgorithm) -> bool;
}
