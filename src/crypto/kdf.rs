//! Password-based key derivation: PBKDF2-HMAC-SHA256 and Argon2id.

use crate::config::{argon2_params, KEY_LENGTH, MAX_PBKDF2_ITERATIONS, SALT_LENGTH};
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// A 256-bit key, wiped from memory when dropped.
pub type DerivedKey = Zeroizing<[u8; KEY_LENGTH]>;

/// Key derivation function and its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KdfAlgorithm {
    /// PBKDF2 with HMAC-SHA-256.
    Pbkdf2Sha256 { iterations: u32 },
    /// Argon2id v0x13.
    Argon2id {
        memory_kib: u32,
        time_cost: u32,
        parallelism: u32,
    },
}

impl KdfAlgorithm {
    /// Argon2id with the default cost parameters.
    pub fn argon2id() -> Self {
        KdfAlgorithm::Argon2id {
            memory_kib: argon2_params::MEMORY_COST,
            time_cost: argon2_params::TIME_COST,
            parallelism: argon2_params::PARALLELISM,
        }
    }

    /// Stable numeric identifier, bound into envelope associated data.
    pub fn id(&self) -> u8 {
        match self {
            KdfAlgorithm::Pbkdf2Sha256 { .. } => 1,
            KdfAlgorithm::Argon2id { .. } => 2,
        }
    }

    /// Cost parameters in declaration order.
    pub fn params(&self) -> Vec<u32> {
        match *self {
            KdfAlgorithm::Pbkdf2Sha256 { iterations } => vec![iterations],
            KdfAlgorithm::Argon2id {
                memory_kib,
                time_cost,
                parallelism,
            } => vec![memory_kib, time_cost, parallelism],
        }
    }

    /// Check the cost parameters without deriving anything.
    pub fn validate(&self) -> Result<()> {
        match *self {
            KdfAlgorithm::Pbkdf2Sha256 { iterations } => check_iterations(iterations),
            KdfAlgorithm::Argon2id {
                memory_kib,
                time_cost,
                parallelism,
            } => {
                if memory_kib > argon2_params::MAX_MEMORY_COST
                    || time_cost > argon2_params::MAX_TIME_COST
                    || parallelism > argon2_params::MAX_PARALLELISM
                {
                    return Err(Error::validation(format!(
                        "Argon2id parameters exceed limits (memory {} KiB, time {}, parallelism {})",
                        argon2_params::MAX_MEMORY_COST,
                        argon2_params::MAX_TIME_COST,
                        argon2_params::MAX_PARALLELISM
                    )));
                }
                self.argon2_params().map(|_| ())
            }
        }
    }

    /// Derive a 256-bit key from `password` and `salt`.
    pub fn derive_key(&self, password: &[u8], salt: &[u8; SALT_LENGTH]) -> Result<DerivedKey> {
        if password.is_empty() {
            return Err(Error::validation("Password is required for key derivation"));
        }
        self.validate()?;
        match *self {
            KdfAlgorithm::Pbkdf2Sha256 { iterations } => derive(password, salt, iterations),
            KdfAlgorithm::Argon2id { .. } => {
                let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.argon2_params()?);
                let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
                argon2
                    .hash_password_into(password, salt, key.as_mut_slice())
                    .map_err(|e| Error::KeyDerivation(e.to_string()))?;
                Ok(key)
            }
        }
    }

    fn argon2_params(&self) -> Result<Params> {
        match *self {
            KdfAlgorithm::Argon2id {
                memory_kib,
                time_cost,
                parallelism,
            } => Params::new(memory_kib, time_cost, parallelism, Some(KEY_LENGTH))
                .map_err(|e| Error::validation(format!("Invalid Argon2id parameters: {e}"))),
            KdfAlgorithm::Pbkdf2Sha256 { .. } => Err(Error::KeyDerivation(
                "PBKDF2 has no Argon2id parameters".to_string(),
            )),
        }
    }
}

/// Check a PBKDF2 round count against `1..=MAX_PBKDF2_ITERATIONS`.
pub fn check_iterations(iterations: u32) -> Result<()> {
    if iterations == 0 {
        return Err(Error::validation("Iterations must be at least 1"));
    }
    if iterations > MAX_PBKDF2_ITERATIONS {
        return Err(Error::validation(format!(
            "Iterations must be at most {MAX_PBKDF2_ITERATIONS}"
        )));
    }
    Ok(())
}

/// Derive a 256-bit key with PBKDF2-HMAC-SHA256.
///
/// Identical inputs always produce the identical key.
pub fn derive(password: &[u8], salt: &[u8; SALT_LENGTH], iterations: u32) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(Error::validation("Password is required for key derivation"));
    }
    check_iterations(iterations)?;

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_slice());
    Ok(key)
}

/// Key derivation bound to one salt.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    salt: [u8; SALT_LENGTH],
    algorithm: KdfAlgorithm,
}

impl KeyDeriver {
    /// Create a deriver with a fresh random salt.
    pub fn new(algorithm: KdfAlgorithm) -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self { salt, algorithm }
    }

    /// Create a deriver from an existing salt (for decryption).
    pub fn from_salt(salt: [u8; SALT_LENGTH], algorithm: KdfAlgorithm) -> Self {
        Self { salt, algorithm }
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// Get the configured algorithm.
    pub fn algorithm(&self) -> KdfAlgorithm {
        self.algorithm
    }

    /// Derive the key for `password`.
    pub fn derive_key(&self, password: &[u8]) -> Result<DerivedKey> {
        self.algorithm.derive_key(password, &self.salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_ARGON2: KdfAlgorithm = KdfAlgorithm::Argon2id {
        memory_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    };

    #[test]
    fn test_pbkdf2_known_answer() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1, 32)
        let mut out = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = [1u8; SALT_LENGTH];
        let key1 = derive(b"password123", &salt, 1000).unwrap();
        let key2 = derive(b"password123", &salt, 1000).unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn test_each_input_changes_key() {
        let salt = [2u8; SALT_LENGTH];
        let base = derive(b"password", &salt, 1000).unwrap();

        let other_password = derive(b"passwore", &salt, 1000).unwrap();
        let other_salt = derive(b"password", &[3u8; SALT_LENGTH], 1000).unwrap();
        let other_iterations = derive(b"password", &salt, 1001).unwrap();

        assert_ne!(*base, *other_password);
        assert_ne!(*base, *other_salt);
        assert_ne!(*base, *other_iterations);
    }

    #[test]
    fn test_rejects_empty_password_and_zero_iterations() {
        let salt = [0u8; SALT_LENGTH];
        assert!(matches!(derive(b"", &salt, 1), Err(Error::Validation(_))));
        assert!(matches!(derive(b"pw", &salt, 0), Err(Error::Validation(_))));
    }

    #[test]
    fn test_argon2id_deterministic() {
        let kdf = KeyDeriver::from_salt([4u8; SALT_LENGTH], FAST_ARGON2);
        let key1 = kdf.derive_key(b"password").unwrap();
        let key2 = kdf.derive_key(b"password").unwrap();
        assert_eq!(*key1, *key2);

        let pbkdf2 = KdfAlgorithm::Pbkdf2Sha256 { iterations: 1 };
        let pbkdf2 = KeyDeriver::from_salt([4u8; SALT_LENGTH], pbkdf2);
        assert_ne!(*key1, *pbkdf2.derive_key(b"password").unwrap());
    }

    #[test]
    fn test_argon2id_invalid_params() {
        let bad = KdfAlgorithm::Argon2id {
            memory_kib: 1,
            time_cost: 0,
            parallelism: 1,
        };
        assert!(bad.validate().is_err());
        assert!(KeyDeriver::from_salt([0u8; SALT_LENGTH], bad)
            .derive_key(b"pw")
            .is_err());
    }

    #[test]
    fn test_cost_limits() {
        assert!(check_iterations(MAX_PBKDF2_ITERATIONS).is_ok());
        assert!(matches!(
            check_iterations(MAX_PBKDF2_ITERATIONS + 1),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            derive(b"pw", &[0u8; SALT_LENGTH], u32::MAX),
            Err(Error::Validation(_))
        ));

        let huge = KdfAlgorithm::Argon2id {
            memory_kib: u32::MAX,
            time_cost: 1,
            parallelism: 1,
        };
        assert!(matches!(huge.validate(), Err(Error::Validation(_))));
        assert!(KeyDeriver::from_salt([0u8; SALT_LENGTH], huge)
            .derive_key(b"pw")
            .is_err());

        let slow = KdfAlgorithm::Argon2id {
            memory_kib: 1024,
            time_cost: argon2_params::MAX_TIME_COST + 1,
            parallelism: 1,
        };
        assert!(slow.validate().is_err());
        assert!(KdfAlgorithm::argon2id().validate().is_ok());
    }

    #[test]
    fn test_new_generates_random_salt() {
        let kdf1 = KeyDeriver::new(KdfAlgorithm::Pbkdf2Sha256 { iterations: 1 });
        let kdf2 = KeyDeriver::new(KdfAlgorithm::Pbkdf2Sha256 { iterations: 1 });
        assert_ne!(kdf1.salt(), kdf2.salt());
    }

    #[test]
    fn test_kdf_serde_names() {
        let json = serde_json::to_string(&KdfAlgorithm::Pbkdf2Sha256 { iterations: 7 }).unwrap();
        assert_eq!(json, r#"{"pbkdf2-sha256":{"iterations":7}}"#);
        let parsed: KdfAlgorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, KdfAlgorithm::Pbkdf2Sha256 { iterations: 7 });
    }
}
