//! Password-based encryption facade.
//!
//! [`Encryptor`] ties key derivation, the cipher and the codec together for
//! text and binary payloads. Every call is independent: a fresh salt and IV
//! are generated per encryption and the derived key is wiped before the call
//! returns.

use crate::config::{EncryptorConfig, IV_LENGTH, SALT_LENGTH};
use crate::crypto::{check_iterations, Cipher, CipherAlgorithm, KdfAlgorithm, KeyDeriver};
use crate::encoding::{self, Envelope};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const EMPTY_TEXT: &str = "Text to encrypt cannot be empty";
const EMPTY_FILE: &str = "File to encrypt cannot be empty";
const EMPTY_CIPHERTEXT: &str = "Encrypted data cannot be empty";
const ENCRYPT_PASSWORD_REQUIRED: &str = "Password is required for encryption";
const DECRYPT_PASSWORD_REQUIRED: &str = "Password is required for decryption";
const SALT_IV_REQUIRED: &str = "Salt and IV are required for decryption";

/// Base64-encoded output of one encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// AES-256-CBC ciphertext.
    pub ciphertext: String,
    /// PBKDF2 salt (16 bytes).
    pub salt: String,
    /// CBC IV (16 bytes).
    pub iv: String,
}

/// Password-based encryptor.
///
/// Holds only immutable configuration, so one instance can be shared across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Encryptor {
    config: EncryptorConfig,
}

impl Encryptor {
    /// Create an encryptor from a validated configuration.
    pub fn new(config: EncryptorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &EncryptorConfig {
        &self.config
    }

    /// Encrypt UTF-8 text.
    ///
    /// `iterations` overrides the configured PBKDF2 round count. The same
    /// count must be supplied to [`Encryptor::decrypt_text`].
    pub fn encrypt_text(
        &self,
        text: &str,
        password: &str,
        iterations: Option<u32>,
    ) -> Result<EncryptionResult> {
        if text.is_empty() {
            return Err(Error::validation(EMPTY_TEXT));
        }
        self.encrypt_payload(text.as_bytes(), password, iterations)
    }

    /// Decrypt text produced by [`Encryptor::encrypt_text`].
    pub fn decrypt_text(
        &self,
        ciphertext: &str,
        password: &str,
        salt: &str,
        iv: &str,
        iterations: Option<u32>,
    ) -> Result<String> {
        let plaintext = self.decrypt_payload(ciphertext, password, salt, iv, iterations)?;
        utf8(plaintext)
    }

    /// Encrypt arbitrary bytes.
    pub fn encrypt_file(
        &self,
        data: &[u8],
        password: &str,
        iterations: Option<u32>,
    ) -> Result<EncryptionResult> {
        if data.is_empty() {
            return Err(Error::validation(EMPTY_FILE));
        }
        self.encrypt_payload(data, password, iterations)
    }

    /// Decrypt bytes produced by [`Encryptor::encrypt_file`].
    pub fn decrypt_file(
        &self,
        ciphertext: &str,
        password: &str,
        salt: &str,
        iv: &str,
        iterations: Option<u32>,
    ) -> Result<Vec<u8>> {
        self.decrypt_payload(ciphertext, password, salt, iv, iterations)
    }

    /// Join a result into the `salt:iv:ciphertext` artifact.
    pub fn format_encrypted_output(result: &EncryptionResult) -> String {
        encoding::format(result)
    }

    /// Split a `salt:iv:ciphertext` artifact.
    pub fn parse_encrypted_input(artifact: &str) -> Result<EncryptionResult> {
        encoding::parse(artifact)
    }

    /// Seal UTF-8 text into a self-describing envelope.
    pub fn seal_text(&self, text: &str, password: &str) -> Result<Envelope> {
        if text.is_empty() {
            return Err(Error::validation(EMPTY_TEXT));
        }
        self.seal_payload(text.as_bytes(), password)
    }

    /// Seal arbitrary bytes into a self-describing envelope.
    pub fn seal_file(&self, data: &[u8], password: &str) -> Result<Envelope> {
        if data.is_empty() {
            return Err(Error::validation(EMPTY_FILE));
        }
        self.seal_payload(data, password)
    }

    /// Open an envelope sealed by [`Encryptor::seal_text`].
    pub fn open_text(&self, envelope: &Envelope, password: &str) -> Result<String> {
        utf8(self.open_file(envelope, password)?)
    }

    /// Open an envelope. Only the password is needed.
    pub fn open_file(&self, envelope: &Envelope, password: &str) -> Result<Vec<u8>> {
        if password.is_empty() {
            return Err(Error::validation(DECRYPT_PASSWORD_REQUIRED));
        }
        envelope.validate()?;

        let plaintext = open_envelope(envelope, password).map_err(Error::into_decryption);
        match &plaintext {
            Ok(data) => debug!(bytes = data.len(), cipher = ?envelope.cipher, "opened envelope"),
            Err(e) => debug!(error = %e, "envelope rejected"),
        }
        plaintext
    }

    fn encrypt_payload(
        &self,
        plaintext: &[u8],
        password: &str,
        iterations: Option<u32>,
    ) -> Result<EncryptionResult> {
        if password.is_empty() {
            return Err(Error::validation(ENCRYPT_PASSWORD_REQUIRED));
        }
        let iterations = self.resolve_iterations(iterations)?;

        let kdf = KeyDeriver::new(KdfAlgorithm::Pbkdf2Sha256 { iterations });
        let iv = CipherAlgorithm::Aes256Cbc.generate_iv();
        let ciphertext =
            seal_with(&kdf, CipherAlgorithm::Aes256Cbc, password, &iv, plaintext, &[])
                .map_err(Error::into_encryption)?;

        debug!(bytes = plaintext.len(), iterations, "encrypted payload");

        Ok(EncryptionResult {
            ciphertext: encoding::to_base64(&ciphertext),
            salt: encoding::to_base64(kdf.salt()),
            iv: encoding::to_base64(&iv),
        })
    }

    fn decrypt_payload(
        &self,
        ciphertext: &str,
        password: &str,
        salt: &str,
        iv: &str,
        iterations: Option<u32>,
    ) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(Error::validation(EMPTY_CIPHERTEXT));
        }
        if password.is_empty() {
            return Err(Error::validation(DECRYPT_PASSWORD_REQUIRED));
        }
        if salt.is_empty() || iv.is_empty() {
            return Err(Error::validation(SALT_IV_REQUIRED));
        }
        let iterations = self.resolve_iterations(iterations)?;

        let plaintext = decrypt_parts(ciphertext, password, salt, iv, iterations)
            .map_err(Error::into_decryption);
        match &plaintext {
            Ok(data) => debug!(bytes = data.len(), iterations, "decrypted payload"),
            Err(e) => debug!(error = %e, "decryption rejected"),
        }
        plaintext
    }

    fn seal_payload(&self, plaintext: &[u8], password: &str) -> Result<Envelope> {
        if password.is_empty() {
            return Err(Error::validation(ENCRYPT_PASSWORD_REQUIRED));
        }

        let cipher = self.config.envelope_cipher;
        let kdf = KeyDeriver::new(self.config.envelope_kdf);
        let mut envelope =
            Envelope::new(kdf.algorithm(), cipher, *kdf.salt(), cipher.generate_iv());
        let aad = envelope.associated_data();
        envelope.ciphertext = seal_with(&kdf, cipher, password, &envelope.iv, plaintext, &aad)
            .map_err(Error::into_encryption)?;

        debug!(
            bytes = plaintext.len(),
            kdf = ?envelope.kdf,
            cipher = ?envelope.cipher,
            "sealed envelope"
        );
        Ok(envelope)
    }

    fn resolve_iterations(&self, iterations: Option<u32>) -> Result<u32> {
        let iterations = iterations.unwrap_or(self.config.iterations);
        check_iterations(iterations)?;
        Ok(iterations)
    }
}

fn seal_with(
    kdf: &KeyDeriver,
    algorithm: CipherAlgorithm,
    password: &str,
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let key = kdf.derive_key(password.as_bytes())?;
    Cipher::new(key, algorithm).encrypt(iv, plaintext, aad)
}

fn decrypt_parts(
    ciphertext: &str,
    password: &str,
    salt: &str,
    iv: &str,
    iterations: u32,
) -> Result<Vec<u8>> {
    let salt: [u8; SALT_LENGTH] = decode_fixed(salt, "Salt")?;
    let iv: [u8; IV_LENGTH] = decode_fixed(iv, "IV")?;
    let ciphertext = encoding::from_base64(ciphertext)?;

    let kdf = KeyDeriver::from_salt(salt, KdfAlgorithm::Pbkdf2Sha256 { iterations });
    let key = kdf.derive_key(password.as_bytes())?;
    Cipher::new(key, CipherAlgorithm::Aes256Cbc).decrypt(&iv, &ciphertext, &[])
}

fn open_envelope(envelope: &Envelope, password: &str) -> Result<Vec<u8>> {
    let kdf = KeyDeriver::from_salt(envelope.salt_array()?, envelope.kdf);
    let key = kdf.derive_key(password.as_bytes())?;
    Cipher::new(key, envelope.cipher).decrypt(
        &envelope.iv,
        &envelope.ciphertext,
        &envelope.associated_data(),
    )
}

fn decode_fixed<const N: usize>(encoded: &str, field: &str) -> Result<[u8; N]> {
    let bytes = encoding::from_base64(encoded)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::format(format!("{field} must be {N} bytes, got {len}")))
}

/// Non-UTF-8 plaintext after a successful decrypt is indistinguishable from a
/// padding failure to the caller.
fn utf8(plaintext: Vec<u8>) -> Result<String> {
    String::from_utf8(plaintext).map_err(|_| Error::Decryption)
}
