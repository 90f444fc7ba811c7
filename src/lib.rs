//! passcrypt
//!
//! Password-based encryption of text and binary payloads into portable,
//! Base64-encoded artifacts.
//!
//! # Features
//!
//! - **PBKDF2-HMAC-SHA256 key derivation**: 100,000 rounds by default, Argon2id optional
//! - **AES-256-CBC**: the `salt:iv:ciphertext` artifact format
//! - **AES-256-GCM envelopes**: versioned, self-describing, tamper-evident
//! - **Zeroized keys**: derived keys are wiped as soon as a call returns
//!
//! # Architecture
//!
//! ```text
//! Password + Salt → Derive (PBKDF2/Argon2id) → Encrypt (AES-256) → Encode (Base64)
//! ```
//!
//! # Example
//!
//! ```rust
//! use passcrypt::{Encryptor, EncryptorConfig};
//!
//! let encryptor = Encryptor::new(EncryptorConfig::with_iterations(1_000)).unwrap();
//!
//! let result = encryptor.encrypt_text("Hello, World!", "password", None).unwrap();
//! let artifact = Encryptor::format_encrypted_output(&result);
//!
//! let parts = Encryptor::parse_encrypted_input(&artifact).unwrap();
//! let text = encryptor
//!     .decrypt_text(&parts.ciphertext, "password", &parts.salt, &parts.iv, None)
//!     .unwrap();
//! assert_eq!(text, "Hello, World!");
//! ```

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod encryptor;
pub mod error;

pub use config::EncryptorConfig;
pub use encoding::Envelope;
pub use encryptor::{EncryptionResult, Encryptor};
pub use error::{Error, ErrorKind, Result};
