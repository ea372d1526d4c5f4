//! Value Codec
//!
//! The single (de)serialization boundary shared by both tiers. Values are
//! stored as compact JSON bytes, so an entry written to the remote tier can be
//! read back from the local mirror and vice versa.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Encodes a value into the bytes stored by either tier.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes bytes previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
