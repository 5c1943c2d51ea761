use super::core::Collection;
use crate::document::Document;
use crate::index::{index_insert_all, IndexImpl, IndexKind};
use crate::types::DocumentId;

impl Collection {
    // --- Index admin helpers ---
    /// Builds an index over one or more fields (a compound index when `fields.len() > 1`),
    /// rejecting the build if `unique` is set and the existing data already violates it.
    ///
    /// # Errors
    /// Returns `DbError::UniqueConstraintViolation` if `unique` is set and two existing
    /// documents already share a non-null key over `fields`.
    pub fn create_index(
        &self,
        fields: &[String],
        kind: IndexKind,
        unique: bool,
    ) -> Result<(), crate::errors::DbError> {
        let _wguard = self.build_lock.write();
        let mut mgr = self.indexes.write();
        mgr.create_index(fields, kind, unique);
        // offline build: rebuild from current cache
        let start = std::time::Instant::now();
        let ids_docs: Vec<(DocumentId, Document)> = {
            let cache = self.cache.clone();
            let store = cache.store.read();
            store.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect()
        };
        for (id, doc) in &ids_docs {
            if let Err(e) = index_insert_all(&mut mgr, &doc.data.0, id) {
                mgr.drop_index(fields);
                return Err(e);
            }
        }
        // record build time on the created index only
        let key = fields.join(",");
        if let Some(idx) = mgr.indexes.get_mut(&key) {
            let elapsed = start.elapsed().as_millis();
            match idx {
                IndexImpl::Hash(h) => h.stats.build_time_ms = elapsed,
                IndexImpl::BTree(b) => b.stats.build_time_ms = elapsed,
            }
        }
        Ok(())
    }

    pub fn drop_index(&self, fields: &[String]) {
        let _wguard = self.build_lock.write();
        self.indexes.write().drop_index(fields);
    }
}
