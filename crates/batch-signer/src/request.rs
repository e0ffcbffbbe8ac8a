use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::{DigestAlgorithm, calculate_digest};

/// DER-encoded X.509 certificate.
///
/// The engine never parses it; it only needs the bytes for routing and for
/// embedding into the rendered signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Lowercase hex SHA-256 of the DER bytes. Workers are keyed by this.
    pub fn hex_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.der))
    }
}

/// A named payload that takes part in a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    name: String,
    digest_algorithm: DigestAlgorithm,
    data: Vec<u8>,
    message: Option<Vec<u8>>,
}

impl MessagePart {
    /// A part known only by its hash, e.g. an attachment.
    pub fn new(name: impl Into<String>, digest_algorithm: DigestAlgorithm, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            digest_algorithm,
            data,
            message: None,
        }
    }

    /// A message part that keeps the original message bytes along with their hash.
    pub fn message(
        name: impl Into<String>,
        digest_algorithm: DigestAlgorithm,
        message: impl Into<Vec<u8>>,
    ) -> Self {
        let message = message.into();
        Self {
            name: name.into(),
            digest_algorithm,
            data: calculate_digest(digest_algorithm, &message),
            message: Some(message),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Hash of the part.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn message_bytes(&self) -> Option<&[u8]> {
        self.message.as_deref()
    }
}

/// One caller's unit of work.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    signing_cert: Certificate,
    parts: Vec<MessagePart>,
    extra_certificates: Vec<Certificate>,
    ocsp_responses: Vec<Vec<u8>>,
}

impl SigningRequest {
    pub fn new(signing_cert: Certificate, parts: Vec<MessagePart>) -> Self {
        Self {
            signing_cert,
            parts,
            extra_certificates: Vec::new(),
            ocsp_responses: Vec::new(),
        }
    }

    pub fn with_extra_certificates(mut self, certificates: Vec<Certificate>) -> Self {
        self.extra_certificates = certificates;
        self
    }

    pub fn with_ocsp_responses(mut self, responses: Vec<Vec<u8>>) -> Self {
        self.ocsp_responses = responses;
        self
    }

    pub fn signing_cert(&self) -> &Certificate {
        &self.signing_cert
    }

    pub fn parts(&self) -> &[MessagePart] {
        &self.parts
    }

    pub fn extra_certificates(&self) -> &[Certificate] {
        &self.extra_certificates
    }

    pub fn ocsp_responses(&self) -> &[Vec<u8>] {
        &self.ocsp_responses
    }

    /// Returns the message bytes when the request is a single message
    /// without attachments.
    pub fn single_message(&self) -> Option<&[u8]> {
        match self.parts.as_slice() {
            [part] => part.message_bytes(),
            _ => None,
        }
    }

    /// Part hashes in order: message first, attachments after.
    pub fn part_hashes(&self) -> Vec<Vec<u8>> {
        self.parts.iter().map(|part| part.data.clone()).collect()
    }
}

/// Result handed back to a caller.
///
/// `hash_chain_result` and `hash_chain` are only present when the request was
/// signed through a hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureData {
    pub signature: String,
    pub hash_chain_result: Option<String>,
    pub hash_chain: Option<String>,
}

impl SignatureData {
    pub fn is_batch_signature(&self) -> bool {
        self.hash_chain_result.is_some()
    }
}
