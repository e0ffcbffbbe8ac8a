use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::SignerError;

/// Hash algorithms usable for message parts, hash chains and signing digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl DigestAlgorithm {
    pub fn id(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// XML-DSig digest method URI.
    pub fn uri(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            DigestAlgorithm::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            DigestAlgorithm::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA-256" | "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA-384" | "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA-512" | "SHA512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(SignerError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Signature algorithms a token may be asked to apply to a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignAlgorithm {
    #[serde(rename = "SHA256withRSA")]
    RsaSha256,
    #[serde(rename = "SHA384withRSA")]
    RsaSha384,
    #[serde(rename = "SHA512withRSA")]
    RsaSha512,
    #[serde(rename = "SHA256withECDSA")]
    EcdsaSha256,
    #[serde(rename = "SHA384withECDSA")]
    EcdsaSha384,
    #[serde(rename = "SHA512withECDSA")]
    EcdsaSha512,
}

impl SignAlgorithm {
    pub fn id(&self) -> &'static str {
        match self {
            SignAlgorithm::RsaSha256 => "SHA256withRSA",
            SignAlgorithm::RsaSha384 => "SHA384withRSA",
            SignAlgorithm::RsaSha512 => "SHA512withRSA",
            SignAlgorithm::EcdsaSha256 => "SHA256withECDSA",
            SignAlgorithm::EcdsaSha384 => "SHA384withECDSA",
            SignAlgorithm::EcdsaSha512 => "SHA512withECDSA",
        }
    }

    /// XML-DSig signature method URI.
    pub fn uri(&self) -> &'static str {
        match self {
            SignAlgorithm::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            SignAlgorithm::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            SignAlgorithm::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            SignAlgorithm::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            SignAlgorithm::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            SignAlgorithm::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
        }
    }

    pub fn digest(&self) -> DigestAlgorithm {
        match self {
            SignAlgorithm::RsaSha256 | SignAlgorithm::EcdsaSha256 => DigestAlgorithm::Sha256,
            SignAlgorithm::RsaSha384 | SignAlgorithm::EcdsaSha384 => DigestAlgorithm::Sha384,
            SignAlgorithm::RsaSha512 | SignAlgorithm::EcdsaSha512 => DigestAlgorithm::Sha512,
        }
    }

    pub fn is_ecdsa(&self) -> bool {
        matches!(
            self,
            SignAlgorithm::EcdsaSha256 | SignAlgorithm::EcdsaSha384 | SignAlgorithm::EcdsaSha512
        )
    }

    pub fn is_rsa(&self) -> bool {
        !self.is_ecdsa()
    }
}

impl fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SignAlgorithm {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SignAlgorithm::RsaSha256,
            SignAlgorithm::RsaSha384,
            SignAlgorithm::RsaSha512,
            SignAlgorithm::EcdsaSha256,
            SignAlgorithm::EcdsaSha384,
            SignAlgorithm::EcdsaSha512,
        ]
        .into_iter()
        .find(|algorithm| algorithm.id().eq_ignore_ascii_case(s))
        .ok_or_else(|| SignerError::UnknownAlgorithm(s.to_string()))
    }
}

pub fn calculate_digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

/// Maps a signature algorithm identifier (e.g. `SHA512withRSA`) to the
/// digest algorithm it hashes with.
pub fn resolve_digest_algorithm(signature_algorithm_id: &str) -> Result<DigestAlgorithm, SignerError> {
    signature_algorithm_id
        .parse::<SignAlgorithm>()
        .map(|algorithm| algorithm.digest())
}
