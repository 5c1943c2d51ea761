#[path = "mod_crypto.rs"]
mod crypto_tests;
