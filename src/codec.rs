//! JSON encoding of records and identifier indexes.
//!
//! Decoding is strict: every field must be present, unknown fields are
//! rejected, the record must carry the identifier it is stored under and
//! must pass [`Record::check`]. Any violation is a
//! [`LoyaltyError::CorruptRecord`].

use crate::entity::{EntityKind, Record};
use crate::error::{LoyaltyError, Result};
use serde_json::{Map, Value};

/// Encodes a record for storage.
pub fn encode<T: Record>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| LoyaltyError::corrupt(record.id(), e))
}

/// Decodes the record stored under `key`.
pub fn decode<T: Record>(key: &str, bytes: &[u8]) -> Result<T> {
    let record: T = serde_json::from_slice(bytes).map_err(|e| {
        LoyaltyError::corrupt(key, format!("{} ({})", e, String::from_utf8_lossy(bytes)))
    })?;

    if record.id() != key {
        return Err(LoyaltyError::corrupt(
            key,
            format!("{} record carries identifier {}", T::KIND, record.id()),
        ));
    }

    record.check().map_err(|reason| LoyaltyError::corrupt(key, reason))?;
    Ok(record)
}

/// Encodes an identifier index as `{"<index key>": [ids...]}`.
pub fn encode_index(kind: EntityKind, ids: &[String]) -> Result<Vec<u8>> {
    let mut holder = Map::new();
    holder.insert(kind.index_key().to_string(), Value::from(ids.to_vec()));
    serde_json::to_vec(&Value::Object(holder))
        .map_err(|e| LoyaltyError::corrupt(kind.index_key(), e))
}

/// Decodes an identifier index written by [`encode_index`].
pub fn decode_index(kind: EntityKind, bytes: &[u8]) -> Result<Vec<String>> {
    let key = kind.index_key();
    let mut holder: Map<String, Value> =
        serde_json::from_slice(bytes).map_err(|e| LoyaltyError::corrupt(key, e))?;

    let ids = holder
        .remove(key)
        .ok_or_else(|| LoyaltyError::corrupt(key, format!("missing field `{}`", key)))?;

    if let Some(unexpected) = holder.keys().next() {
        return Err(LoyaltyError::corrupt(key, format!("unknown field `{}`", unexpected)));
    }

    serde_json::from_value(ids).map_err(|e| LoyaltyError::corrupt(key, e))
}
