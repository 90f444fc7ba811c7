//! Cryptographic operations for passcrypt.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 and Argon2id password-based key derivation
//! - AES-256-CBC (PKCS#7) and AES-256-GCM encryption

mod cipher;
mod kdf;

pub use cipher::{decrypt, encrypt, Cipher, CipherAlgorithm};
pub use kdf::{check_iterations, derive, DerivedKey, KdfAlgorithm, KeyDeriver};
