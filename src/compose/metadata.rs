use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Auxiliary-data label under which order datums are revealed.
pub const ORDER_DATUM_METADATA_LABEL: u64 = 103251;

/// Ledger limit on a metadata byte string.
pub const METADATA_CHUNK_BYTES: usize = 64;

/// `label -> { datum hash -> [cbor chunk, ...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionMetadata {
    pub label: u64,
    pub datums: BTreeMap<String, Vec<String>>,
}

impl TransactionMetadata {
    pub fn new() -> Self {
        Self {
            label: ORDER_DATUM_METADATA_LABEL,
            datums: BTreeMap::new(),
        }
    }

    /// Record `cbor_hex` under `hash`, split into chunks of at most
    /// [`METADATA_CHUNK_BYTES`] bytes.
    pub fn with_datum(mut self, hash: &str, cbor_hex: &str) -> Self {
        let chunks = cbor_hex
            .as_bytes()
            .chunks(METADATA_CHUNK_BYTES * 2)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        self.datums.insert(hash.to_string(), chunks);
        self
    }

    /// Reassembled cbor for `hash`.
    pub fn datum(&self, hash: &str) -> Option<String> {
        self.datums.get(hash).map(|chunks| chunks.concat())
    }

    /// Detailed-schema JSON, as accepted by transaction builders.
    pub fn to_json(&self) -> Value {
        let entries: Vec<Value> = self
            .datums
            .iter()
            .map(|(hash, chunks)| {
                json!({
                    "k": { "bytes": hash },
                    "v": { "list": chunks.iter().map(|c| json!({ "bytes": c })).collect::<Vec<_>>() },
                })
            })
            .collect();
        json!({ self.label.to_string(): { "map": entries } })
    }
}
