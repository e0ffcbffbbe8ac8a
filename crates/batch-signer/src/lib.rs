pub mod batch_signer;
pub mod config;
pub mod digest;
pub mod error;
pub mod hashchain;
pub mod request;
pub mod signing;
pub mod token;
pub mod worker;

pub use batch_signer::BatchSigner;
pub use config::BatchSignerConfig;
pub use digest::{DigestAlgorithm, SignAlgorithm, calculate_digest, resolve_digest_algorithm};
pub use error::SignerError;
pub use hashchain::{HashChainBuilder, HashChainError, HashChainVerifier};
pub use request::{Certificate, MessagePart, SignatureData, SigningRequest};
pub use signing::SigningContext;
pub use token::{RsaKey, Secp256k1Key, SoftwareToken, TokenClient, TokenKey};
