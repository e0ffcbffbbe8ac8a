use serde::{Deserialize, Serialize};

use crate::digest::{DigestAlgorithm, SignAlgorithm, calculate_digest};
use crate::error::SignerError;
use crate::request::SigningRequest;

/// The rendered signature handed to callers.
///
/// Carries no signing time or other wall-clock data, so the same batch always
/// renders to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDocument {
    pub signature_method: String,
    pub signing_certificate: DigestValue,
    pub reference: Reference,
    pub signature_value: String,
    pub certificate_values: Vec<String>,
    pub ocsp_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestValue {
    pub digest_method: String,
    pub digest_value: String,
}

impl DigestValue {
    pub fn new(algorithm: DigestAlgorithm, digest: &[u8]) -> Self {
        Self {
            digest_method: algorithm.uri().to_string(),
            digest_value: hex::encode(digest),
        }
    }
}

/// What the signature value covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub uri: String,
    #[serde(flatten)]
    pub digest: DigestValue,
}

impl SignatureDocument {
    /// Prepares the document from the request owning the signing certificate.
    /// The signature value is filled in by [`render`](Self::render).
    pub(crate) fn prepare(request: &SigningRequest, algorithm: SignAlgorithm, reference: Reference) -> Self {
        let digest = algorithm.digest();
        Self {
            signature_method: algorithm.uri().to_string(),
            signing_certificate: DigestValue::new(
                digest,
                &calculate_digest(digest, request.signing_cert().der()),
            ),
            reference,
            signature_value: String::new(),
            certificate_values: request
                .extra_certificates()
                .iter()
                .map(|cert| hex::encode(cert.der()))
                .collect(),
            ocsp_values: request.ocsp_responses().iter().map(hex::encode).collect(),
        }
    }

    pub(crate) fn render(&self, signature_value: &[u8]) -> Result<String, SignerError> {
        let document = Self {
            signature_value: hex::encode(signature_value),
            ..self.clone()
        };
        serde_json::to_string(&document)
            .map_err(|e| SignerError::Internal(format!("rendering signature document: {e}")))
    }
}
