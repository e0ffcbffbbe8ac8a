use super::{HashChain, HashChainError, HashChainResult, Side, digest_hash_step, leaf_hash};

/// Checks a single input against a hash chain result using only that
/// input's own part hashes.
pub struct HashChainVerifier;

impl HashChainVerifier {
    pub fn verify(
        hash_chain_result: &str,
        hash_chain: &str,
        part_hashes: &[Vec<u8>],
    ) -> Result<(), HashChainError> {
        let result: HashChainResult = serde_json::from_str(hash_chain_result)
            .map_err(|e| HashChainError::Malformed(format!("hash chain result: {e}")))?;
        let chain: HashChain = serde_json::from_str(hash_chain)
            .map_err(|e| HashChainError::Malformed(format!("hash chain: {e}")))?;

        if result.digest_method != chain.digest_method {
            return Err(HashChainError::Mismatch(format!(
                "digest method {} differs from result digest method {}",
                chain.digest_method, result.digest_method
            )));
        }

        if part_hashes.is_empty() {
            return Err(HashChainError::EmptyInput);
        }
        if chain.data_refs.len() != part_hashes.len() {
            return Err(HashChainError::Mismatch(format!(
                "chain references {} parts, {} given",
                chain.data_refs.len(),
                part_hashes.len()
            )));
        }
        for (data_ref, hash) in chain.data_refs.iter().zip(part_hashes) {
            if decode(&data_ref.digest_value)? != *hash {
                return Err(HashChainError::Mismatch(format!(
                    "digest of {} does not match",
                    data_ref.uri
                )));
            }
        }

        let mut current = leaf_hash(chain.digest_method, part_hashes);
        for step in &chain.steps {
            let sibling = decode(&step.digest_value)?;
            current = match step.side {
                Side::Left => digest_hash_step(chain.digest_method, &[&sibling, &current]),
                Side::Right => digest_hash_step(chain.digest_method, &[&current, &sibling]),
            };
        }

        if current != decode(&result.digest_value)? {
            return Err(HashChainError::Mismatch(
                "computed tree top differs from hash chain result".to_string(),
            ));
        }

        Ok(())
    }
}

fn decode(value: &str) -> Result<Vec<u8>, HashChainError> {
    hex::decode(value).map_err(|e| HashChainError::Malformed(format!("invalid digest value: {e}")))
}
