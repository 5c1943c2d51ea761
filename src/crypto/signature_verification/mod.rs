//! Signature algorithms: ECDSA (P-256)
pub mod ecdsa;

// Re-export stable API
pub use ecdsa::{generate_p256_keypair_pem, sign_file_p256, verify_file_p256};
