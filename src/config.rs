//! Configuration constants and types for passcrypt.

use crate::crypto::{check_iterations, CipherAlgorithm, KdfAlgorithm};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// CBC initialization vector length in bytes (one AES block).
pub const IV_LENGTH: usize = 16;

/// AES-GCM nonce length in bytes (96 bits).
pub const GCM_NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const GCM_TAG_LENGTH: usize = 16;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Derived key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Upper bound on PBKDF2 rounds, so untrusted input cannot stall a decrypt.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Envelope magic number: "PCRY" in bytes.
pub const ENVELOPE_MAGIC: [u8; 4] = *b"PCRY";

/// Current envelope version. The unversioned `salt:iv:ciphertext` form is version 1.
pub const ENVELOPE_VERSION: u8 = 2;

/// Argon2id parameters for envelope key derivation.
pub mod argon2_params {
    /// Memory cost in KiB (64 MB).
    pub const MEMORY_COST: u32 = 65536;

    /// Time cost (iterations).
    pub const TIME_COST: u32 = 3;

    /// Parallelism factor.
    pub const PARALLELISM: u32 = 4;

    /// Largest accepted memory cost in KiB (1 GiB).
    pub const MAX_MEMORY_COST: u32 = 1 << 20;

    /// Largest accepted time cost.
    pub const MAX_TIME_COST: u32 = 64;

    /// Largest accepted parallelism factor.
    pub const MAX_PARALLELISM: u32 = 64;
}

/// Configuration for an [`Encryptor`](crate::Encryptor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptorConfig {
    /// PBKDF2 rounds used by the `salt:iv:ciphertext` operations when the
    /// caller does not pass an explicit count.
    pub iterations: u32,

    /// Key derivation recorded in sealed envelopes.
    pub envelope_kdf: KdfAlgorithm,

    /// Cipher used for sealed envelopes.
    pub envelope_cipher: CipherAlgorithm,
}

impl Default for EncryptorConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            envelope_kdf: KdfAlgorithm::Pbkdf2Sha256 {
                iterations: DEFAULT_ITERATIONS,
            },
            envelope_cipher: CipherAlgorithm::Aes256Gcm,
        }
    }
}

impl EncryptorConfig {
    /// Create a configuration with a custom iteration count for both paths.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            envelope_kdf: KdfAlgorithm::Pbkdf2Sha256 { iterations },
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        check_iterations(self.iterations)?;
        self.envelope_kdf.validate()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EncryptorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
