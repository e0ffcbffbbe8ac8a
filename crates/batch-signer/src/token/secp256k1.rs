use anyhow::{Result, bail};
use k256::ecdsa::{SigningKey, VerifyingKey, signature::hazmat::PrehashSigner};
use sha2::{Digest, Sha256};

use super::key::TokenKey;
use crate::digest::SignAlgorithm;

/// ECDSA key on the secp256k1 curve.
///
/// Created from a seed string: the SHA-256 hash of the seed
/// becomes the 32-byte private key.
pub struct Secp256k1Key {
    signing_key: SigningKey,
}

impl Secp256k1Key {
    pub fn from_seed(seed: &str) -> Result<Self> {
        let hash = Sha256::digest(seed.as_bytes());
        let signing_key = SigningKey::from_bytes((&hash).into())
            .map_err(|e| anyhow::anyhow!("invalid seed: {e}"))?;
        Ok(Self { signing_key })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl TokenKey for Secp256k1Key {
    fn sign_digest(&self, algorithm: SignAlgorithm, digest: &[u8]) -> Result<Vec<u8>> {
        if !self.supports(algorithm) {
            bail!("secp256k1 key cannot sign with {algorithm}");
        }
        let (signature, _): (k256::ecdsa::Signature, _) = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| anyhow::anyhow!("secp256k1 sign_prehash failed: {e}"))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    fn supports(&self, algorithm: SignAlgorithm) -> bool {
        algorithm.is_ecdsa()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::signature::hazmat::PrehashVerifier;

    #[test]
    fn deterministic_signing() {
        let key = Secp256k1Key::from_seed("test-seed").unwrap();
        let digest = Sha256::digest(b"hello");
        let sig1 = key.sign_digest(SignAlgorithm::EcdsaSha256, &digest).unwrap();
        let sig2 = key.sign_digest(SignAlgorithm::EcdsaSha256, &digest).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn different_seeds_produce_different_keys() {
        let key_a = Secp256k1Key::from_seed("seed-a").unwrap();
        let key_b = Secp256k1Key::from_seed("seed-b").unwrap();
        assert_ne!(key_a.public_key_bytes(), key_b.public_key_bytes());
    }

    #[test]
    fn signature_is_64_bytes_and_verifies() {
        let key = Secp256k1Key::from_seed("test-seed").unwrap();
        let digest = Sha256::digest(b"data");
        let sig = key.sign_digest(SignAlgorithm::EcdsaSha256, &digest).unwrap();
        assert_eq!(sig.len(), 64);

        let signature = k256::ecdsa::Signature::from_slice(&sig).unwrap();
        key.verifying_key().verify_prehash(&digest, &signature).unwrap();
    }

    #[test]
    fn public_key_is_33_bytes_compressed() {
        let key = Secp256k1Key::from_seed("test-seed").unwrap();
        assert_eq!(key.public_key_bytes().len(), 33);
    }

    #[test]
    fn rejects_rsa_algorithm() {
        let key = Secp256k1Key::from_seed("test-seed").unwrap();
        let digest = Sha256::digest(b"data");
        assert!(key.sign_digest(SignAlgorithm::RsaSha256, &digest).is_err());
    }
}
