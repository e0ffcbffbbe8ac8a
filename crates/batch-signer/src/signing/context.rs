use tracing::trace;

use super::document::{DigestValue, Reference, SignatureDocument};
use crate::digest::{SignAlgorithm, calculate_digest};
use crate::error::SignerError;
use crate::hashchain::HashChainBuilder;
use crate::request::{SignatureData, SigningRequest};

/// Label of the hash chain result, used as the root of every hash chain.
pub const SIG_HASH_CHAIN: &str = "/sig-hashchain";
/// Reference the signature carries when it covers a hash chain result.
pub const SIG_HASH_CHAIN_RESULT: &str = "/sig-hashchain-result";
/// Label of the message part in a hash chain.
pub const MESSAGE: &str = "/message";

enum Prepared {
    /// One request with one plain message: signed directly.
    Single { document: SignatureDocument },
    /// Everything else: signed through a hash chain.
    HashChain {
        document: SignatureDocument,
        hash_chain_result: String,
        hash_chains: Vec<String>,
    },
}

/// Collects the requests sharing one token signature.
///
/// The request list is frozen by the first call to
/// [`data_to_be_signed`](Self::data_to_be_signed).
pub struct SigningContext {
    key_id: String,
    algorithm: SignAlgorithm,
    requests: Vec<SigningRequest>,
    prepared: Option<(Vec<u8>, Prepared)>,
}

impl SigningContext {
    pub fn new(key_id: impl Into<String>, algorithm: SignAlgorithm) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm,
            requests: Vec::new(),
            prepared: None,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn algorithm(&self) -> SignAlgorithm {
        self.algorithm
    }

    pub fn add(&mut self, request: SigningRequest) -> Result<(), SignerError> {
        if self.prepared.is_some() {
            return Err(SignerError::ContextFrozen);
        }
        self.requests.push(request);
        Ok(())
    }

    /// The bytes whose digest the token signs: the message itself for a
    /// lone single-message request, the hash chain result otherwise.
    pub fn data_to_be_signed(&mut self) -> Result<&[u8], SignerError> {
        if self.prepared.is_none() {
            self.prepared = Some(self.prepare()?);
        }
        match &self.prepared {
            Some((data, _)) => Ok(data.as_slice()),
            None => Err(SignerError::Internal("signing context not prepared".to_string())),
        }
    }

    /// Digest of [`data_to_be_signed`](Self::data_to_be_signed) with the
    /// signature algorithm's digest algorithm.
    pub fn digest_to_be_signed(&mut self) -> Result<Vec<u8>, SignerError> {
        let digest_algorithm = self.algorithm.digest();
        Ok(calculate_digest(digest_algorithm, self.data_to_be_signed()?))
    }

    fn prepare(&self) -> Result<(Vec<u8>, Prepared), SignerError> {
        trace!("data_to_be_signed(requests = {})", self.requests.len());

        let first = self.requests.first().ok_or(SignerError::EmptyContext)?;

        if self.requests.len() == 1 {
            if let (Some(message), [part]) = (first.single_message(), first.parts()) {
                let reference = Reference {
                    uri: part.name().to_string(),
                    digest: DigestValue::new(part.digest_algorithm(), part.data()),
                };
                let document = SignatureDocument::prepare(first, self.algorithm, reference);
                return Ok((message.to_vec(), Prepared::Single { document }));
            }
        }

        let (hash_chain_result, hash_chains) = self.build_hash_chain()?;

        let digest_algorithm = self.algorithm.digest();
        let reference = Reference {
            uri: SIG_HASH_CHAIN_RESULT.to_string(),
            digest: DigestValue::new(
                digest_algorithm,
                &calculate_digest(digest_algorithm, hash_chain_result.as_bytes()),
            ),
        };
        let document = SignatureDocument::prepare(first, self.algorithm, reference);

        Ok((
            hash_chain_result.clone().into_bytes(),
            Prepared::HashChain {
                document,
                hash_chain_result,
                hash_chains,
            },
        ))
    }

    fn build_hash_chain(&self) -> Result<(String, Vec<String>), SignerError> {
        trace!("build_hash_chain()");

        let mut builder = HashChainBuilder::new(self.algorithm.digest());
        for request in &self.requests {
            builder.add_input_hash(&request.part_hashes())?;
        }
        builder.finish_building()?;

        Ok((
            builder.hash_chain_result(SIG_HASH_CHAIN)?,
            builder.hash_chains(MESSAGE)?,
        ))
    }

    /// Renders one [`SignatureData`] per request, in the order requests were
    /// added. Each request gets the hash chain at its own index.
    pub fn create_signature_data(&self, signature_value: &[u8]) -> Result<Vec<SignatureData>, SignerError> {
        let (_, prepared) = self.prepared.as_ref().ok_or_else(|| {
            SignerError::Internal("data to be signed was never computed".to_string())
        })?;

        match prepared {
            Prepared::Single { document } => Ok(vec![SignatureData {
                signature: document.render(signature_value)?,
                hash_chain_result: None,
                hash_chain: None,
            }]),
            Prepared::HashChain {
                document,
                hash_chain_result,
                hash_chains,
            } => {
                let signature = document.render(signature_value)?;
                Ok(hash_chains
                    .iter()
                    .map(|hash_chain| SignatureData {
                        signature: signature.clone(),
                        hash_chain_result: Some(hash_chain_result.clone()),
                        hash_chain: Some(hash_chain.clone()),
                    })
                    .collect())
            }
        }
    }
}
