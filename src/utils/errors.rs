use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Document not found: {0}")]
    NoSuchDocument(String),

    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(String),

    #[error("WAL error: {0}")]
    WalError(String),

    #[error("WASP shadow paging error: {0}")]
    ShadowPagingError(String),

    #[error("WASP snapshot error: {0}")]
    SnapshotError(String),

    #[error("WASP page map error: {0}")]
    PageMapError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Signature verification error: {0}")]
    SignatureVerificationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Database Not Found")]
    DatabaseNotFound,

    #[error("rate-limited")]
    RateLimited,

    #[error("rate-limited; retry-after-ms: {retry_after_ms}")]
    RateLimitedWithRetry { retry_after_ms: u64 },

    #[error("feature not implemented: {0}")]
    FeatureNotImplemented(String),

    #[error("wrong password")]
    InvalidPassword,

    #[error("page conflict on page {page_id}: expected base version {expected}, found {found}")]
    PageConflict { page_id: u32, expected: u64, found: u64 },

    #[error("write conflict: transaction {txn_id} lost the race to commit")]
    WriteConflict { txn_id: u64 },

    #[error("unique constraint violated on index {index}: key already used by doc {existing}")]
    UniqueConstraintViolation { index: String, existing: i32 },

    #[error("corrupted page {page_id}: checksum mismatch")]
    CorruptedPage { page_id: u32 },

    #[error("WAL frame checksum or salt mismatch at frame {frame_no}")]
    WalChecksumMismatch { frame_no: u64 },

    #[error("database marked suspect after an integrity failure; reopen to retry recovery")]
    DatabaseSuspect,

    #[error("out of pages: allocation bitmap and file growth both exhausted")]
    OutOfPages,

    #[error("collection catalog is full and cannot grow further")]
    CatalogFull,

    #[error("transaction is read-only and cannot write")]
    ReadOnlyTransaction,

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}
