use tracing::trace;

use super::{
    DataRef, HashChain, HashChainError, HashChainResult, HashStep, STEP, Side, attachment_uri,
    digest_hash_step, leaf_hash,
};
use crate::digest::DigestAlgorithm;

/// Builds a Merkle tree over input hashes and renders the hash chain result
/// plus one hash chain per input.
///
/// Call [`add_input_hash`](Self::add_input_hash) once per input, then
/// [`finish_building`](Self::finish_building). Results are only available
/// after the tree is finished and inputs can no longer be added.
pub struct HashChainBuilder {
    algorithm: DigestAlgorithm,
    inputs: Vec<Vec<Vec<u8>>>,
    /// `levels[0]` holds the leaves, the last level holds the tree top.
    levels: Option<Vec<Vec<Vec<u8>>>>,
}

impl HashChainBuilder {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            inputs: Vec::new(),
            levels: None,
        }
    }

    /// Adds one input. The first hash belongs to the message, the rest to
    /// its attachments.
    pub fn add_input_hash(&mut self, hashes: &[Vec<u8>]) -> Result<(), HashChainError> {
        if self.levels.is_some() {
            return Err(HashChainError::AlreadyFinished);
        }
        if hashes.is_empty() {
            return Err(HashChainError::EmptyInput);
        }
        self.inputs.push(hashes.to_vec());
        Ok(())
    }

    pub fn finish_building(&mut self) -> Result<(), HashChainError> {
        if self.levels.is_some() {
            return Err(HashChainError::AlreadyFinished);
        }
        if self.inputs.is_empty() {
            return Err(HashChainError::NoInputs);
        }

        let leaves: Vec<Vec<u8>> = self
            .inputs
            .iter()
            .map(|parts| leaf_hash(self.algorithm, parts))
            .collect();

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            trace!("combining {} nodes", level.len());
            let next: Vec<Vec<u8>> = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => digest_hash_step(self.algorithm, &[left, right]),
                    // Odd node out is promoted unchanged.
                    [single] => single.clone(),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }

        self.levels = Some(levels);
        Ok(())
    }

    pub fn tree_top(&self) -> Result<&[u8], HashChainError> {
        let levels = self.levels.as_ref().ok_or(HashChainError::NotFinished)?;
        levels
            .last()
            .and_then(|top| top.first())
            .map(Vec::as_slice)
            .ok_or(HashChainError::NoInputs)
    }

    /// Canonical JSON encoding of the tree top.
    pub fn hash_chain_result(&self, root_label: &str) -> Result<String, HashChainError> {
        let result = HashChainResult {
            digest_method: self.algorithm,
            digest_value: hex::encode(self.tree_top()?),
            uri: format!("{root_label}#{STEP}0"),
        };
        serde_json::to_string(&result).map_err(|e| HashChainError::Malformed(e.to_string()))
    }

    /// Canonical JSON hash chains, one per input in the order they were added.
    pub fn hash_chains(&self, leaf_label: &str) -> Result<Vec<String>, HashChainError> {
        let levels = self.levels.as_ref().ok_or(HashChainError::NotFinished)?;

        (0..self.inputs.len())
            .map(|index| {
                let chain = self.make_hash_chain(levels, index, leaf_label);
                serde_json::to_string(&chain).map_err(|e| HashChainError::Malformed(e.to_string()))
            })
            .collect()
    }

    fn make_hash_chain(&self, levels: &[Vec<Vec<u8>>], index: usize, leaf_label: &str) -> HashChain {
        trace!("making hash chain for input {index}");

        let data_refs = self.inputs[index]
            .iter()
            .enumerate()
            .map(|(part, hash)| DataRef {
                uri: if part == 0 {
                    leaf_label.to_string()
                } else {
                    attachment_uri(part)
                },
                digest_value: hex::encode(hash),
            })
            .collect();

        let mut steps = Vec::new();
        let mut position = index;
        for level in &levels[..levels.len() - 1] {
            let sibling = position ^ 1;
            if let Some(hash) = level.get(sibling) {
                steps.push(HashStep {
                    id: format!("{STEP}{}", steps.len()),
                    side: if position % 2 == 0 { Side::Right } else { Side::Left },
                    digest_value: hex::encode(hash),
                });
            }
            position /= 2;
        }

        HashChain {
            digest_method: self.algorithm,
            data_refs,
            steps,
        }
    }
}
