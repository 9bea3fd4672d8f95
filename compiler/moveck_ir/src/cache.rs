//! Serialized function bodies.
//!
//! Bodies are cached after mandatory checking. Anything decoded from a
//! cache is therefore already canonical, and is flagged so the checker
//! leaves it alone.

use crate::ir::Function;

/// Failure to encode or decode cached bodies.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to serialize function bodies: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to deserialize function bodies: {0}")]
    Decode(#[source] bincode::Error),
}

/// Bincode-encode a list of checked functions.
pub fn encode_functions(funcs: &[Function]) -> Result<Vec<u8>, CacheError> {
    bincode::serialize(funcs).map_err(CacheError::Encode)
}

/// Decode functions from `bytes`, marking each as deserialized canonical.
pub fn decode_functions(bytes: &[u8]) -> Result<Vec<Function>, CacheError> {
    let mut funcs: Vec<Function> = bincode::deserialize(bytes).map_err(CacheError::Decode)?;
    for func in &mut funcs {
        func.deserialized_canonical = true;
    }
    tracing::debug!(count = funcs.len(), "decoded cached function bodies");
    Ok(funcs)
}
