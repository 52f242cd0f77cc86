//! Byte layout of the city store as written to the shell's key-value store.
//!
//! Current layout is a CBOR envelope (magic, schema version, blake3 checksum)
//! around the CBOR-encoded store. Payloads that look like a JSON object are
//! read as the legacy flat dictionary `{"Country": ["City", ...]}` and are
//! rewritten in the current layout on the next save.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::capabilities::kv::MAX_VALUE_SIZE;
use crate::city_store::CityStore;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
/// Encoded stores must fit in a single key-value entry.
pub const MAX_STORE_BYTES: usize = MAX_VALUE_SIZE;
const STORE_MAGIC: &[u8; 4] = b"CITY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted store: {reason}")]
    Corrupted { reason: &'static str },

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityCheckFailed { expected: String, actual: String },

    #[error("schema version {found} is newer than supported {max}")]
    FutureSchema { found: u32, max: u32 },

    #[error("unknown schema version: {0}")]
    UnknownSchema(u32),

    #[error("store too large: {size} bytes, max {max}")]
    StoreTooLarge { size: usize, max: usize },

    #[error("invalid store contents: {0}")]
    InvalidData(String),
}

impl From<ciborium::de::Error<std::io::Error>> for StoreError {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for StoreError {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct StoreEnvelope {
    magic: [u8; 4],
    schema_version: u32,
    checksum: [u8; 32],
    payload: Vec<u8>,
}

#[instrument(level = "debug", skip(store), fields(countries = store.len()))]
pub fn encode(store: &CityStore) -> Result<Vec<u8>, StoreError> {
    let mut payload = Vec::new();
    ciborium::into_writer(store, &mut payload)?;

    let envelope = StoreEnvelope {
        magic: *STORE_MAGIC,
        schema_version: CURRENT_SCHEMA_VERSION,
        checksum: *blake3::hash(&payload).as_bytes(),
        payload,
    };

    let mut bytes = Vec::new();
    ciborium::into_writer(&envelope, &mut bytes)?;

    if bytes.len() > MAX_STORE_BYTES {
        return Err(StoreError::StoreTooLarge {
            size: bytes.len(),
            max: MAX_STORE_BYTES,
        });
    }
    Ok(bytes)
}

#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<CityStore, StoreError> {
    if bytes.len() > MAX_STORE_BYTES {
        return Err(StoreError::StoreTooLarge {
            size: bytes.len(),
            max: MAX_STORE_BYTES,
        });
    }

    if bytes.is_empty() {
        return Err(StoreError::Corrupted {
            reason: "empty payload",
        });
    }

    if is_legacy_dictionary(bytes) {
        return decode_legacy(bytes);
    }

    let envelope: StoreEnvelope = ciborium::from_reader(bytes)?;

    if envelope.magic != *STORE_MAGIC {
        return Err(StoreError::Corrupted {
            reason: "invalid magic bytes",
        });
    }

    if envelope.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::FutureSchema {
            found: envelope.schema_version,
            max: CURRENT_SCHEMA_VERSION,
        });
    }

    let actual_checksum = blake3::hash(&envelope.payload);
    if actual_checksum.as_bytes() != &envelope.checksum {
        return Err(StoreError::IntegrityCheckFailed {
            expected: hex::encode(envelope.checksum),
            actual: hex::encode(actual_checksum.as_bytes()),
        });
    }

    match envelope.schema_version {
        CURRENT_SCHEMA_VERSION => Ok(ciborium::from_reader(&envelope.payload[..])?),
        other => Err(StoreError::UnknownSchema(other)),
    }
}

fn is_legacy_dictionary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

fn decode_legacy(bytes: &[u8]) -> Result<CityStore, StoreError> {
    let store: CityStore =
        serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    info!(
        countries = store.len(),
        cities = store.city_count(),
        "imported legacy city dictionary"
    );
    Ok(store)
}
