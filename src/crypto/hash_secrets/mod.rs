//! Secret field hashing implementations.
//! - Argon2id-based hashing for selected fields

pub mod argon2;

// Keep the original public API surface
pub use argon2::hash_secret_fields;
