use crate::types::SerializableDateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Per-document bookkeeping. `version` is the document's page-version analogue (design note
/// "Arena + index for trees"): it is the unit `Transaction` compares at commit time to detect a
/// first-committer-wins conflict, bumped by one on every committed write to this document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub created_at: SerializableDateTime,
    pub updated_at: SerializableDateTime,
    pub version: u64,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = SerializableDateTime(Utc::now());
        Self { created_at: now.clone(), updated_at: now, version: 0 }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
