//! Value encoding for stored entities.
//!
//! All entities are stored as bincode. Decoding failures on data we wrote
//! ourselves mean the database is damaged, so they surface as
//! [`StoreError::Corruption`] with the offending key.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::StoreError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::Corruption(format!("key {}: {e}", hex::encode(key))))
}
