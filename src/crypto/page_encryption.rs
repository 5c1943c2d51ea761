//! Page-level at-rest encryption: `EncryptedPageIo`.
//!
//! Wraps a raw page buffer with a 32-byte header (magic, KDF iteration count, PBKDF2-SHA512
//! salt, page size) and encrypts every page independently with AES-256-GCM, keyed off a
//! password via PBKDF2-SHA512. Unwritten (all-zero) pages decrypt back to all zeros so a
//! freshly-grown file needs no special-casing on first read. Mirrors the username+password
//! PBE scheme in `file_encryption::pbe_encrypt_file`, but keyed per-page rather than per-file
//! and using PBKDF2 in place of Argon2id, per the page-envelope format the storage layer needs.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroizing;

const MAGIC: &[u8; 4] = b"GPEN"; // GaldrDb Page ENcryption
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
/// magic(4) + iterations(4) + salt(16) + page_size(4) + reserved(4)
const HEADER_LEN: usize = 32;
const DEFAULT_ITERATIONS: u32 = 210_000;

#[derive(Debug, Error)]
pub enum PageCryptError {
    #[error("page envelope too short: {0} bytes")]
    Truncated(usize),
    #[error("bad page envelope magic")]
    BadMagic,
    #[error("wrong password or corrupted page")]
    AuthenticationFailed,
}

/// Derives a per-database AES-256 key from a password via PBKDF2-HMAC-SHA512, then
/// encrypts/decrypts individual page buffers with a fresh random nonce each write.
pub struct EncryptedPageIo {
    key: Zeroizing<[u8; 32]>,
    salt: [u8; SALT_LEN],
    iterations: u32,
    page_size: usize,
}

impl EncryptedPageIo {
    #[must_use]
    pub fn new(password: &str, page_size: usize) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_salt(password, salt, DEFAULT_ITERATIONS, page_size)
    }

    #[must_use]
    pub fn with_salt(password: &str, salt: [u8; SALT_LEN], iterations: u32, page_size: usize) -> Self {
        let mut key: Zeroizing<[u8; 32]> = Zeroizing::new([0u8; 32]);
        pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, iterations, &mut *key);
        Self { key, salt, iterations, page_size }
    }

    /// Reconstructs the KDF context from a previously-written page's header, so every page in
    /// the file can be decrypted with the same derived key regardless of which page is read first.
    pub fn from_header(password: &str, header: &[u8]) -> Result<Self, PageCryptError> {
        if header.len() < HEADER_LEN {
            return Err(PageCryptError::Truncated(header.len()));
        }
        if &header[0..4] != MAGIC {
            return Err(PageCryptError::BadMagic);
        }
        let iterations = u32::from_be_bytes(header[4..8].try_into().unwrap());
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&header[8..8 + SALT_LEN]);
        let page_size = u32::from_be_bytes(header[24..28].try_into().unwrap()) as usize;
        Ok(Self::with_salt(password, salt, iterations, page_size))
    }

    /// Encrypts a plaintext page buffer (expected to be exactly `page_size` bytes) into an
    /// on-disk envelope: `[header(32) | nonce(12) | ciphertext(page_size) | tag(16)]`.
    ///
    /// # Errors
    /// Returns an error only if the underlying AEAD construction rejects the derived key.
    pub fn encrypt_page(&self, plaintext: &[u8]) -> Result<Vec<u8>, PageCryptError> {
        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|_| PageCryptError::AuthenticationFailed)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ct = cipher.encrypt(nonce, plaintext).map_err(|_| PageCryptError::AuthenticationFailed)?;

        let mut out = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ct.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.extend_from_slice(&self.salt);
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.page_size as u32).to_be_bytes());
        out.extend_from_slice(&[0u8; 4]); // reserved
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ct);
        Ok(out)
    }

    /// Decrypts an on-disk page envelope back to its plaintext page buffer. An all-zero
    /// envelope (a page that was allocated by `set_len` but never written) decrypts to an
    /// all-zero plaintext page rather than failing, matching the spec's never-written-page
    /// behavior.
    ///
    /// # Errors
    /// Returns [`PageCryptError::AuthenticationFailed`] on a wrong password or a corrupted/torn
    /// page, and [`PageCryptError::Truncated`]/[`PageCryptError::BadMagic`] on a malformed
    /// envelope.
    pub fn decrypt_page(&self, envelope: &[u8]) -> Result<Vec<u8>, PageCryptError> {
        if envelope.iter().all(|&b| b == 0) {
            return Ok(vec![0u8; self.page_size]);
        }
        if envelope.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
            return Err(PageCryptError::Truncated(envelope.len()));
        }
        if &envelope[0..4] != MAGIC {
            return Err(PageCryptError::BadMagic);
        }
        let nonce_bytes = &envelope[HEADER_LEN..HEADER_LEN + NONCE_LEN];
        let ct = &envelope[HEADER_LEN + NONCE_LEN..];
        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|_| PageCryptError::AuthenticationFailed)?;
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher.decrypt(nonce, ct).map_err(|_| PageCryptError::AuthenticationFailed)
    }

    #[must_use]
    pub const fn envelope_len(&self) -> usize {
        HEADER_LEN + NONCE_LEN + self.page_size + TAG_LEN
    }
}
