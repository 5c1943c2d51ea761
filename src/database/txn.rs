//! Transaction manager: snapshot isolation with first-committer-wins conflict detection.
//!
//! A transaction pins a commit-sequence-number (CSN) and a copy of every page's version it has
//! read at `begin`. On `commit`, each page the transaction wrote is checked against the
//! manager's current version for that page: if another transaction committed a newer version of
//! that page since this one began, the writer loses and the commit is rejected with
//! `DbError::PageConflict`, matching optimistic (first-committer-wins) MVCC rather than
//! pessimistic locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::errors::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    New,
    Active,
    Committed,
    Aborted,
}

/// A pinned view of the database as of `begin`: every page this transaction has touched is
/// checked against the version recorded here at commit time.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub csn: u64,
    read_versions: HashMap<u32, u64>,
}

/// A single transaction's state, owned by its caller and handed back to the manager at
/// `commit`/`abort`. `Active` the whole time between `begin` and `commit`/`abort`; never reused
/// after reaching a terminal state.
#[derive(Debug)]
pub struct Transaction {
    pub id: TxnId,
    pub mode: TxnMode,
    pub state: TxnState,
    pub snapshot: Snapshot,
    write_set: HashMap<u32, u64>,
}

impl Transaction {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxnState::Active
    }

    /// Records that this transaction observed `page_id` at `base_version`, pinning the baseline
    /// that `commit` will later validate against. First read of a page wins; subsequent reads of
    /// the same page within the transaction reuse the original baseline.
    pub fn note_read(&mut self, page_id: u32, base_version: u64) {
        self.snapshot.read_versions.entry(page_id).or_insert(base_version);
    }

    /// Records an intent to write `page_id`. Returns `DbError::ReadOnlyTransaction` for a
    /// read-only transaction.
    ///
    /// # Errors
    /// Returns `DbError::ReadOnlyTransaction` if this transaction was opened read-only.
    pub fn note_write(&mut self, page_id: u32, base_version: u64) -> Result<(), DbError> {
        if self.mode == TxnMode::ReadOnly {
            return Err(DbError::ReadOnlyTransaction);
        }
        self.note_read(page_id, base_version);
        self.write_set.insert(page_id, base_version);
        Ok(())
    }
}

/// Tracks the current version of every page and hands out monotonically increasing CSNs and
/// transaction ids. Shared across all transactions via `Arc<TransactionManager>`.
#[derive(Debug, Default)]
pub struct TransactionManager {
    next_txn_id: AtomicU64,
    csn: AtomicU64,
    page_versions: RwLock<HashMap<u32, u64>>,
}

impl TransactionManager {
    #[must_use]
    pub fn new() -> Self {
        Self { next_txn_id: AtomicU64::new(1), csn: AtomicU64::new(0), page_versions: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn current_version(&self, page_id: u32) -> u64 {
        self.page_versions.read().get(&page_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn begin(&self, mode: TxnMode) -> Transaction {
        let id = TxnId(self.next_txn_id.fetch_add(1, Ordering::Relaxed));
        let csn = self.csn.load(Ordering::Acquire);
        Transaction {
            id,
            mode,
            state: TxnState::Active,
            snapshot: Snapshot { csn, read_versions: HashMap::new() },
            write_set: HashMap::new(),
        }
    }

    /// Validates every page in `txn`'s write set against the manager's live version and, if none
    /// have moved since `txn` first observed them, bumps each written page's version and assigns
    /// a fresh CSN. The first transaction to commit a conflicting write wins; later conflicting
    /// commits fail.
    ///
    /// # Errors
    /// Returns `DbError::PageConflict` naming the first page whose live version has advanced
    /// past what `txn` observed, or `DbError::WriteConflict` if `txn` isn't in `Active` state.
    pub fn commit(&self, txn: &mut Transaction) -> Result<u64, DbError> {
        if !txn.is_active() {
            return Err(DbError::WriteConflict { txn_id: txn.id.0 });
        }
        let mut versions = self.page_versions.write();
        for (&page_id, &expected) in &txn.write_set {
            let found = versions.get(&page_id).copied().unwrap_or(0);
            if found != expected {
                txn.state = TxnState::Aborted;
                return Err(DbError::PageConflict { page_id, expected, found });
            }
        }
        for &page_id in txn.write_set.keys() {
            versions.entry(page_id).and_modify(|v| *v += 1).or_insert(1);
        }
        drop(versions);
        let new_csn = self.csn.fetch_add(1, Ordering::AcqRel) + 1;
        txn.state = TxnState::Committed;
        Ok(new_csn)
    }

    pub fn abort(&self, txn: &mut Transaction) {
        txn.state = TxnState::Aborted;
    }
}
