//! Secondary index store: compound, order-preserving byte-keyed indexes over one or more
//! document fields, plus a simpler single-field hash index for pure equality lookups.
//!
//! Keys are produced by `database::key_encoding`, so a multi-field (compound) index's byte key
//! is just the concatenation of each field's order-preserving encoding in declared order. That's
//! what makes `PrefixMatch`/`PrefixRangeScan` possible without decoding: a prefix of the
//! concatenated bytes is exactly a prefix of the leading fields.

use crate::database::key_encoding::encode_scalar;
use crate::errors::DbError;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::ops::Bound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Hash,
    BTree,
}

/// The four lookup shapes a `BTreeIndex` scan can take, over an order-preserving compound key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Full compound key matches exactly one encoded key.
    ExactMatch,
    /// Leading fields of the compound key match; remaining fields unconstrained.
    PrefixMatch,
    /// Full compound key falls within `[low, high]`.
    RangeScan,
    /// Leading fields fixed, trailing field ranged within `[low, high]`.
    PrefixRangeScan,
}

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub keys: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub build_time_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKeyKind {
    Str(String),
    F64(OrderedFloat<f64>),
    I64(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqKey(IndexKeyKind);

impl Hash for EqKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            IndexKeyKind::Str(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            IndexKeyKind::F64(f) => {
                1u8.hash(state);
                f.hash(state);
            }
            IndexKeyKind::I64(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            IndexKeyKind::Bool(b) => {
                3u8.hash(state);
                b.hash(state);
            }
        }
    }
}

#[must_use]
pub fn key_from_bson(v: &Bson) -> Option<IndexKeyKind> {
    match v {
        Bson::String(s) => Some(IndexKeyKind::Str(s.clone())),
        Bson::Int32(i) => Some(IndexKeyKind::I64(i64::from(*i))),
        Bson::Int64(i) => Some(IndexKeyKind::I64(*i)),
        Bson::Double(f) => Some(IndexKeyKind::F64(OrderedFloat(*f))),
        Bson::Boolean(b) => Some(IndexKeyKind::Bool(*b)),
        _ => None,
    }
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut cur = doc.get(first)?;
    for p in parts {
        match cur {
            Bson::Document(d) => {
                cur = d.get(p)?;
            }
            _ => return None,
        }
    }
    Some(cur)
}

/// Single-field hash index: exact-match lookups only, no ordering.
#[derive(Debug, Clone)]
pub struct HashIndex {
    pub field: String,
    pub map: HashMap<EqKey, HashSet<DocumentId>>,
    pub stats: IndexStats,
}

impl HashIndex {
    #[must_use]
    pub fn new(field: String) -> Self {
        Self { field, map: HashMap::new(), stats: IndexStats::default() }
    }
    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) {
        if let Some(v) = get_path(doc, &self.field)
            && let Some(k) = key_from_bson(v).map(EqKey)
        {
            let set = self.map.entry(k).or_default();
            if set.insert(id.clone()) {
                self.stats.entries += 1;
            }
            self.stats.keys = self.map.len();
        }
    }
    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        if let Some(v) = get_path(doc, &self.field)
            && let Some(k) = key_from_bson(v).map(EqKey)
            && let Some(set) = self.map.get_mut(&k)
        {
            if set.remove(id) {
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if set.is_empty() {
                self.map.remove(&k);
            }
            self.stats.keys = self.map.len();
        }
    }
    pub fn lookup_eq(&mut self, v: &Bson) -> Option<Vec<DocumentId>> {
        if let Some(k) = key_from_bson(v).map(EqKey)
            && let Some(set) = self.map.get(&k)
        {
            self.stats.hits += 1;
            return Some(set.iter().cloned().collect());
        }
        self.stats.misses += 1;
        None
    }
}

/// Compound, order-preserving index over one or more fields, encoded via `key_encoding`.
/// A single-field index is just the `fields.len() == 1` case of this same structure, which is
/// what lets `ExactMatch`/`RangeScan` serve plain equality/range queries and
/// `PrefixMatch`/`PrefixRangeScan` serve compound lookups once more than one field is indexed.
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub fields: Vec<String>,
    pub unique: bool,
    pub map: BTreeMap<Vec<u8>, Vec<DocumentId>>,
    pub stats: IndexStats,
}

impl BTreeIndex {
    #[must_use]
    pub fn new(fields: Vec<String>, unique: bool) -> Self {
        Self { fields, unique, map: BTreeMap::new(), stats: IndexStats::default() }
    }

    /// Encodes the indexed fields of `doc` into a compound byte key. Returns `None` if any
    /// field holds a value with no order-preserving encoding (documents, arrays, binary, …),
    /// matching how the rest of the index store skips unindexable fields.
    fn encode_key(&self, doc: &BsonDocument) -> Option<Vec<u8>> {
        let mut parts = Vec::with_capacity(self.fields.len());
        for f in &self.fields {
            let v = get_path(doc, f).unwrap_or(&Bson::Null);
            parts.push(encode_scalar(v)?);
        }
        Some(parts.concat())
    }

    /// A unique index exempts keys where any indexed field is null/missing from the uniqueness
    /// check, matching the specification's null-exemption rule for unique indexes.
    fn has_null_field(&self, doc: &BsonDocument) -> bool {
        self.fields.iter().any(|f| matches!(get_path(doc, f), None | Some(Bson::Null)))
    }

    /// # Errors
    /// Returns `DbError::UniqueConstraintViolation` if `unique` is set and another document
    /// already owns the encoded key (and no indexed field is null).
    pub fn check_unique(&self, doc: &BsonDocument, id: &DocumentId) -> Result<(), DbError> {
        let Some(key) = self.encode_key(doc) else { return Ok(()) };
        if self.unique
            && !self.has_null_field(doc)
            && let Some(existing) = self.map.get(&key)
            && let Some(existing_id) = existing.first()
            && existing_id != id
        {
            return Err(DbError::UniqueConstraintViolation {
                index: self.fields.join(","),
                existing: existing_id.0,
            });
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DbError::UniqueConstraintViolation` if `unique` is set and another document
    /// already owns the encoded key (and no indexed field is null).
    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) -> Result<(), DbError> {
        self.check_unique(doc, id)?;
        let Some(key) = self.encode_key(doc) else { return Ok(()) };
        let entry = self.map.entry(key).or_default();
        if !entry.contains(id) {
            entry.push(id.clone());
            self.stats.entries += 1;
        }
        self.stats.keys = self.map.len();
        Ok(())
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let Some(key) = self.encode_key(doc) else { return };
        if let Some(entry) = self.map.get_mut(&key) {
            if let Some(pos) = entry.iter().position(|x| x == id) {
                entry.remove(pos);
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if entry.is_empty() {
                self.map.remove(&key);
            }
        }
        self.stats.keys = self.map.len();
    }

    /// `ExactMatch`: full compound key equals `key`.
    pub fn exact_match(&mut self, key: &[u8]) -> Vec<DocumentId> {
        match self.map.get(key) {
            Some(ids) => {
                self.stats.hits += 1;
                ids.clone()
            }
            None => {
                self.stats.misses += 1;
                Vec::new()
            }
        }
    }

    /// `PrefixMatch`: every key whose encoded bytes start with `prefix`.
    pub fn prefix_match(&mut self, prefix: &[u8]) -> Vec<DocumentId> {
        let out: Vec<DocumentId> = self
            .map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        if out.is_empty() { self.stats.misses += 1 } else { self.stats.hits += 1 }
        out
    }

    /// `RangeScan`: full compound key within `[low, high]`, bounds independently inclusive/exclusive.
    pub fn range_scan(
        &mut self,
        low: Option<&[u8]>,
        high: Option<&[u8]>,
        incl_low: bool,
        incl_high: bool,
    ) -> Vec<DocumentId> {
        let lower = match low {
            Some(b) if incl_low => Bound::Included(b.to_vec()),
            Some(b) => Bound::Excluded(b.to_vec()),
            None => Bound::Unbounded,
        };
        let upper = match high {
            Some(b) if incl_high => Bound::Included(b.to_vec()),
            Some(b) => Bound::Excluded(b.to_vec()),
            None => Bound::Unbounded,
        };
        let out: Vec<DocumentId> =
            self.map.range((lower, upper)).flat_map(|(_, ids)| ids.iter().cloned()).collect();
        if out.is_empty() { self.stats.misses += 1 } else { self.stats.hits += 1 }
        out
    }

    /// `PrefixRangeScan`: leading fields fixed via `prefix`, trailing field ranged within
    /// `[low_suffix, high_suffix]` (suffix bounds are the encoding of just the ranged field).
    pub fn prefix_range_scan(
        &mut self,
        prefix: &[u8],
        low_suffix: Option<&[u8]>,
        high_suffix: Option<&[u8]>,
        incl_low: bool,
        incl_high: bool,
    ) -> Vec<DocumentId> {
        let low_key = low_suffix.map(|s| [prefix, s].concat());
        let high_key = high_suffix.map(|s| [prefix, s].concat());
        let lower = match &low_key {
            Some(b) if incl_low => Bound::Included(b.clone()),
            Some(b) => Bound::Excluded(b.clone()),
            None => Bound::Included(prefix.to_vec()),
        };
        // With no explicit upper bound, stop before any key that no longer shares the prefix.
        let mut prefix_ceiling = prefix.to_vec();
        match prefix_ceiling.last_mut() {
            Some(last) if *last < u8::MAX => *last += 1,
            _ => prefix_ceiling.push(0xFF),
        }
        let upper = match &high_key {
            Some(b) if incl_high => Bound::Included(b.clone()),
            Some(b) => Bound::Excluded(b.clone()),
            None => Bound::Excluded(prefix_ceiling),
        };
        let out: Vec<DocumentId> = self
            .map
            .range((lower, upper))
            .filter(|(k, _)| k.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        if out.is_empty() { self.stats.misses += 1 } else { self.stats.hits += 1 }
        out
    }

    /// BSON-value range lookup used by the query planner's simple single-field index path;
    /// encodes the bounds and delegates to `range_scan`.
    pub fn lookup_range(
        &mut self,
        min: Option<&Bson>,
        max: Option<&Bson>,
        inclusive_min: bool,
        inclusive_max: bool,
    ) -> Option<Vec<DocumentId>> {
        let low = min.and_then(encode_scalar);
        let high = max.and_then(encode_scalar);
        let out = self.range_scan(low.as_deref(), high.as_deref(), inclusive_min, inclusive_max);
        if out.is_empty() { None } else { Some(out) }
    }
}

#[derive(Debug, Clone)]
pub enum IndexImpl {
    Hash(HashIndex),
    BTree(BTreeIndex),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub fields: Vec<String>,
    pub kind: IndexKind,
    #[serde(default)]
    pub unique: bool,
}

pub const INDEX_METADATA_VERSION: u32 = 2;

#[derive(Debug, Default)]
pub struct IndexManager {
    /// Keyed by the indexed fields joined with `,` — a single-field index's key is just the
    /// field name, so existing single-field lookups by field name are unaffected.
    pub indexes: HashMap<String, IndexImpl>,
}

fn index_key(fields: &[String]) -> String {
    fields.join(",")
}

impl IndexManager {
    #[must_use]
    pub fn new() -> Self {
        Self { indexes: HashMap::new() }
    }

    pub fn create_index(&mut self, fields: &[String], kind: IndexKind, unique: bool) {
        let idx = match kind {
            IndexKind::Hash => {
                IndexImpl::Hash(HashIndex::new(fields.first().cloned().unwrap_or_default()))
            }
            IndexKind::BTree => IndexImpl::BTree(BTreeIndex::new(fields.to_vec(), unique)),
        };
        self.indexes.insert(index_key(fields), idx);
    }

    pub fn drop_index(&mut self, fields: &[String]) {
        self.indexes.remove(&index_key(fields));
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .values()
            .map(|i| match i {
                IndexImpl::Hash(h) => IndexDescriptor {
                    fields: vec![h.field.clone()],
                    kind: IndexKind::Hash,
                    unique: false,
                },
                IndexImpl::BTree(b) => IndexDescriptor {
                    fields: b.fields.clone(),
                    kind: IndexKind::BTree,
                    unique: b.unique,
                },
            })
            .collect()
    }
}

/// # Errors
/// Returns `DbError::UniqueConstraintViolation` from the first unique index whose encoded key
/// is already owned by a different document.
pub fn index_check_unique_all(
    mgr: &IndexManager,
    doc: &BsonDocument,
    id: &DocumentId,
) -> Result<(), DbError> {
    for idx in mgr.indexes.values() {
        if let IndexImpl::BTree(b) = idx {
            b.check_unique(doc, id)?;
        }
    }
    Ok(())
}

/// Inserts a document into every index, validating all unique constraints up front so a
/// violation on one index never leaves an earlier index holding a partial insert.
pub fn index_insert_all(
    mgr: &mut IndexManager,
    doc: &BsonDocument,
    id: &DocumentId,
) -> Result<(), DbError> {
    index_check_unique_all(mgr, doc, id)?;
    for idx in mgr.indexes.values_mut() {
        match idx {
            IndexImpl::Hash(h) => h.insert(doc, id),
            IndexImpl::BTree(b) => b.insert(doc, id)?,
        }
    }
    Ok(())
}

pub fn index_remove_all(mgr: &mut IndexManager, doc: &BsonDocument, id: &DocumentId) {
    for idx in mgr.indexes.values_mut() {
        match idx {
            IndexImpl::Hash(h) => h.remove(doc, id),
            IndexImpl::BTree(b) => b.remove(doc, id),
        }
    }
}

pub fn lookup_eq(mgr: &mut IndexManager, field: &str, v: &Bson) -> Option<Vec<DocumentId>> {
    match mgr.indexes.get_mut(field) {
        Some(IndexImpl::Hash(h)) => h.lookup_eq(v),
        Some(IndexImpl::BTree(b)) => {
            let key = encode_scalar(v)?;
            let out = b.exact_match(&key);
            if out.is_empty() { None } else { Some(out) }
        }
        _ => None,
    }
}

pub fn lookup_range(
    mgr: &mut IndexManager,
    field: &str,
    min: Option<&Bson>,
    max: Option<&Bson>,
    incl_min: bool,
    incl_max: bool,
) -> Option<Vec<DocumentId>> {
    match mgr.indexes.get_mut(field) {
        Some(IndexImpl::BTree(b)) => b.lookup_range(min, max, incl_min, incl_max),
        _ => None,
    }
}
