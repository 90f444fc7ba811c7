//! AES-256 encryption: CBC with PKCS#7 padding and GCM authenticated encryption.

use crate::config::{GCM_NONCE_LENGTH, GCM_TAG_LENGTH, IV_LENGTH};
use crate::crypto::kdf::DerivedKey;
use crate::error::{Error, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Block cipher mode used for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    /// AES-256-CBC with PKCS#7 padding. Confidentiality only.
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    /// AES-256-GCM.
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Stable numeric identifier, bound into envelope associated data.
    pub fn id(&self) -> u8 {
        match self {
            CipherAlgorithm::Aes256Cbc => 1,
            CipherAlgorithm::Aes256Gcm => 2,
        }
    }

    /// Required IV / nonce length in bytes.
    pub fn iv_len(&self) -> usize {
        match self {
            CipherAlgorithm::Aes256Cbc => IV_LENGTH,
            CipherAlgorithm::Aes256Gcm => GCM_NONCE_LENGTH,
        }
    }

    /// Generate a fresh random IV / nonce of the right length.
    pub fn generate_iv(&self) -> Vec<u8> {
        let mut iv = vec![0u8; self.iv_len()];
        rand::thread_rng().fill_bytes(&mut iv);
        iv
    }

    /// Whether tampering is detected by the mode itself.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CipherAlgorithm::Aes256Gcm)
    }
}

/// AES-256 cipher owning its derived key for one operation.
///
/// The key is zeroed when the cipher is dropped.
pub struct Cipher {
    key: DerivedKey,
    algorithm: CipherAlgorithm,
}

impl Cipher {
    /// Create a new cipher from a derived key.
    pub fn new(key: DerivedKey, algorithm: CipherAlgorithm) -> Self {
        Self { key, algorithm }
    }

    /// Encrypt `plaintext`.
    ///
    /// `aad` is authenticated by GCM and ignored by CBC.
    pub fn encrypt(&self, iv: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.check_iv(iv)?;
        match self.algorithm {
            CipherAlgorithm::Aes256Cbc => {
                let cipher = Aes256CbcEnc::new_from_slices(self.key.as_slice(), iv)
                    .map_err(|e| Error::Encryption(e.to_string()))?;
                Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
            }
            CipherAlgorithm::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(self.key.as_slice())
                    .map_err(|e| Error::Encryption(e.to_string()))?;
                cipher
                    .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
                    .map_err(|e| Error::Encryption(e.to_string()))
            }
        }
    }

    /// Decrypt `ciphertext` produced by [`Cipher::encrypt`].
    ///
    /// Bad padding, bad length and failed authentication all collapse into
    /// [`Error::Decryption`].
    pub fn decrypt(&self, iv: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.check_iv(iv)?;
        match self.algorithm {
            CipherAlgorithm::Aes256Cbc => {
                let cipher = Aes256CbcDec::new_from_slices(self.key.as_slice(), iv)
                    .map_err(|_| Error::Decryption)?;
                cipher
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| Error::Decryption)
            }
            CipherAlgorithm::Aes256Gcm => {
                if ciphertext.len() < GCM_TAG_LENGTH {
                    return Err(Error::Decryption);
                }
                let cipher = Aes256Gcm::new_from_slice(self.key.as_slice())
                    .map_err(|_| Error::Decryption)?;
                cipher
                    .decrypt(Nonce::from_slice(iv), Payload { msg: ciphertext, aad })
                    .map_err(|_| Error::Decryption)
            }
        }
    }

    fn check_iv(&self, iv: &[u8]) -> Result<()> {
        let expected = self.algorithm.iv_len();
        if iv.len() != expected {
            return Err(Error::validation(format!(
                "IV must be exactly {expected} bytes, got {}",
                iv.len()
            )));
        }
        Ok(())
    }
}

/// Encrypt with AES-256-CBC/PKCS#7 using a pre-derived key.
pub fn encrypt(key: DerivedKey, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key, CipherAlgorithm::Aes256Cbc).encrypt(iv, plaintext, &[])
}

/// Decrypt AES-256-CBC/PKCS#7 ciphertext using a pre-derived key.
pub fn decrypt(key: DerivedKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key, CipherAlgorithm::Aes256Cbc).decrypt(iv, ciphertext, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BLOCK_SIZE, KEY_LENGTH};
    use zeroize::Zeroizing;

    fn key(byte: u8) -> DerivedKey {
        Zeroizing::new([byte; KEY_LENGTH])
    }

    #[test]
    fn test_cbc_roundtrip() {
        let iv = [7u8; IV_LENGTH];
        let plaintext = b"Hello, World! This is a secret message.";

        let ciphertext = encrypt(key(1), &iv, plaintext).unwrap();
        let decrypted = decrypt(key(1), &iv, &ciphertext).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_cbc_ciphertext_is_block_aligned() {
        let iv = [0u8; IV_LENGTH];
        for len in [1usize, 15, 16, 17, 31, 32, 100] {
            let plaintext = vec![0xA5u8; len];
            let ciphertext = encrypt(key(2), &iv, &plaintext).unwrap();
            assert_eq!(ciphertext.len() % BLOCK_SIZE, 0);
            // PKCS#7 always adds at least one byte.
            assert!(ciphertext.len() > len);
        }
    }

    #[test]
    fn test_cbc_known_answer() {
        // NIST SP 800-38A F.2.5, first block, followed by one full padding block.
        let key_bytes: [u8; KEY_LENGTH] = hex::decode(
            "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4",
        )
        .unwrap()
        .try_into()
        .unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = encrypt(Zeroizing::new(key_bytes), &iv, &plaintext).unwrap();
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(
            hex::encode(&ciphertext[..16]),
            "f58c4c04d6e5f1ba779eabfb5f7bfbd6"
        );
    }

    #[test]
    fn test_cbc_rejects_truncated_ciphertext() {
        let iv = [3u8; IV_LENGTH];
        let mut ciphertext = encrypt(key(3), &iv, b"some secret data").unwrap();
        ciphertext.pop();

        assert!(matches!(
            decrypt(key(3), &iv, &ciphertext),
            Err(Error::Decryption)
        ));
        assert!(matches!(decrypt(key(3), &iv, &[]), Err(Error::Decryption)));
    }

    #[test]
    fn test_cbc_bad_padding_detected() {
        // 20 bytes -> two blocks, the second ends in twelve 0x0c padding bytes.
        let iv = [4u8; IV_LENGTH];
        let mut ciphertext = encrypt(key(4), &iv, &[0x42u8; 20]).unwrap();
        // Flipping the last byte of block one flips the final padding byte.
        ciphertext[BLOCK_SIZE - 1] ^= 0xFF;

        assert!(matches!(
            decrypt(key(4), &iv, &ciphertext),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_wrong_iv_length_rejected() {
        assert!(matches!(
            encrypt(key(5), &[0u8; 12], b"data"),
            Err(Error::Validation(_))
        ));
        let gcm = Cipher::new(key(5), CipherAlgorithm::Aes256Gcm);
        assert!(matches!(
            gcm.encrypt(&[0u8; IV_LENGTH], b"data", &[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_gcm_roundtrip_with_aad() {
        let nonce = CipherAlgorithm::Aes256Gcm.generate_iv();
        let cipher = Cipher::new(key(6), CipherAlgorithm::Aes256Gcm);

        let ciphertext = cipher.encrypt(&nonce, b"payload", b"header").unwrap();
        assert_eq!(ciphertext.len(), b"payload".len() + GCM_TAG_LENGTH);

        let decrypted = cipher.decrypt(&nonce, &ciphertext, b"header").unwrap();
        assert_eq!(decrypted, b"payload");
    }

    #[test]
    fn test_gcm_detects_tampering() {
        let nonce = CipherAlgorithm::Aes256Gcm.generate_iv();
        let cipher = Cipher::new(key(7), CipherAlgorithm::Aes256Gcm);
        let ciphertext = cipher.encrypt(&nonce, b"tamper me", b"header").unwrap();

        let mut flipped = ciphertext.clone();
        flipped[0] ^= 0x01;
        assert!(matches!(
            cipher.decrypt(&nonce, &flipped, b"header"),
            Err(Error::Decryption)
        ));
        assert!(matches!(
            cipher.decrypt(&nonce, &ciphertext, b"other header"),
            Err(Error::Decryption)
        ));

        let other = Cipher::new(key(8), CipherAlgorithm::Aes256Gcm);
        assert!(matches!(
            other.decrypt(&nonce, &ciphertext, b"header"),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_generate_iv_lengths() {
        assert_eq!(CipherAlgorithm::Aes256Cbc.generate_iv().len(), 16);
        assert_eq!(CipherAlgorithm::Aes256Gcm.generate_iv().len(), 12);
        assert_ne!(
            CipherAlgorithm::Aes256Cbc.generate_iv(),
            CipherAlgorithm::Aes256Cbc.generate_iv()
        );
    }
}
