//! Database-level facade modules: the storage engine and secondary indexes.
#[path = "../engine.rs"]
pub mod engine;
pub mod index;
pub mod key_encoding;
pub mod txn;
