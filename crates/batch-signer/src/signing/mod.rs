mod context;
mod document;

pub use context::{MESSAGE, SIG_HASH_CHAIN, SIG_HASH_CHAIN_RESULT, SigningContext};
pub use document::{DigestValue, Reference, SignatureDocument};
