//! Merkle hash chains that let several independently owned inputs share one
//! signature.
//!
//! The builder collapses every input (a message plus its attachments) into a
//! single leaf, pairs leaves bottom-up into a binary tree and hands out one
//! chain per input. A chain carries the sibling hashes from its leaf to the
//! tree top, so anyone holding an input's part hashes, its chain and the
//! shared chain result can prove the input was covered by the signature.

mod builder;
mod verifier;

pub use builder::HashChainBuilder;
pub use verifier::HashChainVerifier;

use serde::{Deserialize, Serialize};

use crate::digest::{DigestAlgorithm, calculate_digest};

pub const STEP: &str = "STEP";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashChainError {
    #[error("Cannot add inputs to finished hash chain")]
    AlreadyFinished,
    #[error("Hash chain must be finished first")]
    NotFinished,
    #[error("Hash chain input contains no hashes")]
    EmptyInput,
    #[error("Hash chain has no inputs")]
    NoInputs,
    #[error("Malformed hash chain: {0}")]
    Malformed(String),
    #[error("Hash chain verification failed: {0}")]
    Mismatch(String),
}

/// Top of the tree; this is what gets signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainResult {
    pub digest_method: DigestAlgorithm,
    pub digest_value: String,
    pub uri: String,
}

/// Proof that one input is covered by a [`HashChainResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChain {
    pub digest_method: DigestAlgorithm,
    pub data_refs: Vec<DataRef>,
    pub steps: Vec<HashStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRef {
    pub uri: String,
    pub digest_value: String,
}

/// One level of the path to the tree top: the sibling hash and which side
/// of the current node it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashStep {
    pub id: String,
    pub side: Side,
    pub digest_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Digest over length-prefixed hashes. Used both to collapse a multipart
/// input into a leaf and to combine two tree nodes.
pub(crate) fn digest_hash_step<T: AsRef<[u8]>>(algorithm: DigestAlgorithm, hashes: &[T]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(hashes.iter().map(|h| h.as_ref().len() + 4).sum());
    for hash in hashes {
        let hash = hash.as_ref();
        buf.extend_from_slice(&(hash.len() as u32).to_be_bytes());
        buf.extend_from_slice(hash);
    }
    calculate_digest(algorithm, &buf)
}

pub(crate) fn leaf_hash<T: AsRef<[u8]>>(algorithm: DigestAlgorithm, part_hashes: &[T]) -> Vec<u8> {
    match part_hashes {
        [single] => single.as_ref().to_vec(),
        parts => digest_hash_step(algorithm, parts),
    }
}

pub(crate) fn attachment_uri(index: usize) -> String {
    format!("/attachment{index}")
}
