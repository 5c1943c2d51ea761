#[path = "prop_wal.rs"]
mod wal;
