use crate::cache::CacheConfig;
use crate::collection::Collection;
use crate::index::{IndexDescriptor, INDEX_METADATA_VERSION, IndexKind};
use crate::wasp::{StorageEngine, Wasp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Serialize, Deserialize};

const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Facade over the collection catalog and the paged/WASP storage engine (component C11).
pub struct Engine {
    pub collections: RwLock<HashMap<String, Arc<Collection>>>,
    pub storage: Arc<RwLock<Box<dyn StorageEngine>>>,
    metadata_path: PathBuf,
}

impl Engine {
    /// Opens (or creates) the database file at `path` and rebuilds the index catalog.
    ///
    /// # Errors
    /// Returns an error if the underlying storage engine fails to initialize.
    pub fn new(path: PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let wasp = Wasp::new(path)?;
        let metadata_path = std::env::var("GALDRDB_INDEX_META")
            .map_or_else(|_| PathBuf::from("galdrdb_indexes.json"), PathBuf::from);
        let metadata_path = if metadata_path.is_absolute() {
            metadata_path
        } else {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(metadata_path)
        };
        let engine = Self {
            collections: RwLock::new(HashMap::new()),
            storage: Arc::new(RwLock::new(Box::new(wasp))),
            metadata_path,
        };
        engine.load_indexes_metadata();
        Ok(engine)
    }

    /// Alias for [`Engine::new`] — opens (or creates) a WASP-backed database at `path`.
    pub fn with_wasp(path: PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        Self::new(path)
    }

    pub fn create_collection(&self, name: String) -> Arc<Collection> {
        let collection = Arc::new(Collection::new(
            name.clone(),
            self.storage.clone(),
            DEFAULT_CACHE_CAPACITY,
        ));
        self.collections.write().insert(name, collection.clone());
        self.load_collection_indexes(&collection);
        collection
    }

    pub fn create_collection_with_config(&self, name: String, config: CacheConfig) -> Arc<Collection> {
        let mut collections = self.collections.write();
        let collection = Arc::new(Collection::new_with_config(
            name.clone(),
            self.storage.clone(),
            config,
        ));
        collections.insert(name, collection.clone());
        collection
    }

    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    pub fn list_collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Rename an existing collection.
    ///
    /// # Errors
    /// Returns `NoSuchCollection` if `old` doesn't exist or `CollectionAlreadyExists` if `new` already exists.
    ///
    /// # Panics
    /// Panics only if the internal insertion into the collection map fails during re-insertion, which
    /// should not occur under normal operation.
    pub fn rename_collection(&self, old: &str, new: &str) -> Result<(), crate::errors::DbError> {
        let (mut col, mut should_insert) = (None, false);
        {
            let mut map = self.collections.write();
            if !map.contains_key(old) {
                return Err(crate::errors::DbError::NoSuchCollection(old.to_string()));
            }
            if map.contains_key(new) {
                return Err(crate::errors::DbError::CollectionAlreadyExists(new.to_string()));
            }
            if let Some(c) = map.remove(old) { col = Some(c); should_insert = true; }
        }
        if should_insert {
            if let Some(c) = &col { c.set_name(new.to_string()); }
            self.collections.write().insert(new.to_string(), col.unwrap());
        }
        Ok(())
    }

    fn indexes_meta_path(&self) -> PathBuf { self.metadata_path.clone() }

    pub fn load_indexes_metadata(&self) {
        let path = self.indexes_meta_path();
        if let Ok(bytes) = fs::read(&path) {
            if let Ok(mut meta) = serde_json::from_slice::<IndexesMetadata>(&bytes) {
                for (col_name, descs) in meta.collections.clone() {
                    let col = self
                        .get_collection(&col_name)
                        .map_or_else(|| self.create_collection(col_name.clone()), |c| c);
                    for d in &descs {
                        if let Err(e) = col.create_index(&d.fields, d.kind, d.unique) {
                            log::error!("failed to rebuild index {:?} on {col_name}: {e}", d.fields);
                        }
                    }
                }
                if meta.version != INDEX_METADATA_VERSION {
                    meta.version = INDEX_METADATA_VERSION;
                    let _ = fs::write(&path, serde_json::to_vec_pretty(&meta).unwrap_or_default());
                }
            } else if let Ok(val) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                let mut collections: HashMap<String, Vec<IndexDescriptor>> = HashMap::new();
                if let Some(map) = val.get("collections").and_then(|v| v.as_object()) {
                    for (cname, arr) in map {
                        if let Some(items) = arr.as_array() {
                            let mut v = Vec::new();
                            for it in items {
                                let field = it.get("field").and_then(|x| x.as_str()).unwrap_or("").to_string();
                                let kind_str = it.get("kind").and_then(|x| x.as_str()).unwrap_or("");
                                let kind = match kind_str {
                                    "BTree" | "btree" | "Btree" => IndexKind::BTree,
                                    _ => IndexKind::Hash,
                                };
                                let unique = it.get("unique").and_then(serde_json::Value::as_bool).unwrap_or(false);
                                v.push(IndexDescriptor { fields: vec![field], kind, unique });
                            }
                            collections.insert(cname.clone(), v);
                        }
                    }
                }
                for (col_name, descs) in collections.clone() {
                    let col = self
                        .get_collection(&col_name)
                        .map_or_else(|| self.create_collection(col_name.clone()), |c| c);
                    for d in &descs {
                        if let Err(e) = col.create_index(&d.fields, d.kind, d.unique) {
                            log::error!("failed to rebuild index {:?} on {col_name}: {e}", d.fields);
                        }
                    }
                }
                let meta = IndexesMetadata { version: INDEX_METADATA_VERSION, collections };
                let _ = fs::write(&path, serde_json::to_vec_pretty(&meta).unwrap_or_default());
            }
        }
    }

    /// # Errors
    /// Returns an error if writing index metadata to disk fails.
    pub fn save_indexes_metadata(&self) -> std::io::Result<()> {
        let mut collections_meta: HashMap<String, Vec<IndexDescriptor>> = HashMap::new();
        for (name, col) in self.collections.read().iter() {
            let mgr = col.indexes.read();
            collections_meta.insert(name.clone(), mgr.descriptors());
        }
        let meta = IndexesMetadata { version: INDEX_METADATA_VERSION, collections: collections_meta };
        fs::write(self.indexes_meta_path(), serde_json::to_vec_pretty(&meta).unwrap_or_default())
    }

    fn load_collection_indexes(&self, col: &Arc<Collection>) {
        let path = self.indexes_meta_path();
        if let Ok(bytes) = fs::read(&path)
            && let Ok(meta) = serde_json::from_slice::<IndexesMetadata>(&bytes) {
            if meta.version != INDEX_METADATA_VERSION { return; }
            let name = col.name_str();
            if let Some(descs) = meta.collections.get(&name) {
                for d in descs {
                    if let Err(e) = col.create_index(&d.fields, d.kind, d.unique) {
                        log::error!("failed to rebuild index {:?} on {name}: {e}", d.fields);
                    }
                }
            }
        }
    }

    /// Persist a checkpoint of data and index metadata into the main DB file.
    /// # Errors
    /// Returns an error if the underlying storage engine checkpoint fails.
    pub fn checkpoint_with_indexes(&self, db_path: &std::path::Path) -> std::io::Result<()> {
        let mut map: HashMap<String, Vec<IndexDescriptor>> = HashMap::new();
        for (name, col) in self.collections.read().iter() {
            let mgr = col.indexes.read();
            map.insert(name.clone(), mgr.descriptors());
        }
        self.storage.write().checkpoint_with_meta(db_path, map)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexesMetadata {
    version: u32,
    collections: HashMap<String, Vec<IndexDescriptor>>,
}
