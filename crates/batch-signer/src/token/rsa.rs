use anyhow::{Context, Result, bail};
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::SeedableRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::key::TokenKey;
use crate::digest::{DigestAlgorithm, SignAlgorithm};

const RSA_KEY_BITS: usize = 2048;

/// RSA PKCS#1 v1.5 key.
///
/// Created from a seed string: the SHA-256 hash of the seed
/// seeds a deterministic CSPRNG used for RSA key generation.
pub struct RsaKey {
    private_key: RsaPrivateKey,
}

impl RsaKey {
    pub fn from_seed(seed: &str) -> Result<Self> {
        let hash = Sha256::digest(seed.as_bytes());
        let mut rng = ChaCha20Rng::from_seed(hash.into());
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .context("generating RSA key from seed")?;
        Ok(Self { private_key })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }
}

pub(crate) fn pkcs1v15_scheme(digest: DigestAlgorithm) -> Pkcs1v15Sign {
    match digest {
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

impl TokenKey for RsaKey {
    fn sign_digest(&self, algorithm: SignAlgorithm, digest: &[u8]) -> Result<Vec<u8>> {
        if !self.supports(algorithm) {
            bail!("RSA key cannot sign with {algorithm}");
        }
        self.private_key
            .sign(pkcs1v15_scheme(algorithm.digest()), digest)
            .context("RSA PKCS#1 v1.5 signing")
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        // Encoding a valid in-memory key cannot fail.
        self.private_key
            .to_public_key()
            .to_public_key_der()
            .map(|der| der.into_vec())
            .unwrap_or_default()
    }

    fn supports(&self, algorithm: SignAlgorithm) -> bool {
        algorithm.is_rsa()
    }
}
