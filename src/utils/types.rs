use crate::document::Document;
use bson::Document as BsonDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A document's primary key: a per-collection sequential `i32` assigned from the collection's
/// `nextId` counter, never reused. Plain `i32` rather than a wrapper tuple struct would also work,
/// but the newtype keeps doc ids from being accidentally compared against page ids or CSNs, both
/// of which are also small integers in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub i32);

impl DocumentId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Big-endian bytes, used as the primary B+-tree's key so lexicographic byte order matches
    /// numeric id order (the sign bit is flipped the same way `key_encoding::encode_i64` does).
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 8] {
        crate::database::key_encoding::encode_i64(i64::from(self.0))
    }

    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(crate::database::key_encoding::decode_i64(&bytes) as i32)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A collection name. Kept as a newtype (rather than a bare `String`) so catalog lookups,
/// WAL records, and CLI arguments all go through one comparison/hashing implementation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionName(pub String);

impl From<String> for CollectionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CollectionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for CollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wrapper for `bson::Document` that implements `Serialize`/`Deserialize` as a flat byte blob,
/// so bincode can encode it without going through BSON's own (de)serializer traits.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializableBsonDocument(pub BsonDocument);

impl Serialize for SerializableBsonDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = bson::serialize_to_vec(&self.0).map_err(serde::ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for SerializableBsonDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = <Vec<u8>>::deserialize(deserializer)?;
        let doc = bson::deserialize_from_slice(&bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(doc))
    }
}

/// A wrapper for `chrono::DateTime<Utc>` that implements `Serialize`/`Deserialize` as RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableDateTime(pub DateTime<Utc>);

impl Serialize for SerializableDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for SerializableDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let dt =
            DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?.with_timezone(&Utc);
        Ok(Self(dt))
    }
}

/// Logical mutation record, used both as the WAL-adjacent operation log entry and as the unit
/// replayed during recovery of the in-memory cache/index state.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Operation {
    Insert { document: Document },
    Update { document_id: DocumentId, new_document: Document },
    Delete { document_id: DocumentId },
}
