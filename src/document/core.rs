use crate::document::types::Metadata;
use crate::types::{DocumentId, SerializableBsonDocument, SerializableDateTime};
use bson::Document as BsonDocument;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: SerializableBsonDocument,
    pub metadata: Metadata,
}

impl Document {
    /// Builds a document with a placeholder id; the document store assigns the real id
    /// (from the owning collection's `nextId` catalog counter) at insert time.
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        Self { id: DocumentId::new(0), data: SerializableBsonDocument(data), metadata: Metadata::new() }
    }

    pub fn update(&mut self, new_data: BsonDocument) {
        self.data = SerializableBsonDocument(new_data);
        self.metadata.updated_at = SerializableDateTime(Utc::now());
        self.metadata.version += 1;
    }
}
