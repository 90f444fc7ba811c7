//! Self-describing, versioned container for a sealed payload.
//!
//! Unlike the `salt:iv:ciphertext` artifact, an envelope records the key
//! derivation and cipher it was produced with, so it can be opened with the
//! password alone.
//!
//! Two encodings are supported:
//!
//! ```text
//! JSON:   {"version":2,"kdf":{"pbkdf2-sha256":{"iterations":100000}},
//!          "cipher":"aes-256-gcm","salt":"<b64>","iv":"<b64>","ciphertext":"<b64>"}
//! Binary: "PCRY" || bincode(envelope)
//! ```

use crate::config::{ENVELOPE_MAGIC, ENVELOPE_VERSION, SALT_LENGTH};
use crate::crypto::{CipherAlgorithm, KdfAlgorithm};
use crate::error::{Error, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};

/// A sealed payload plus everything needed to open it except the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope format version.
    pub version: u8,
    /// Key derivation function and parameters.
    pub kdf: KdfAlgorithm,
    /// Cipher used for the payload.
    pub cipher: CipherAlgorithm,
    /// Salt for key derivation.
    #[serde(with = "bytes_field")]
    pub salt: Vec<u8>,
    /// IV (CBC) or nonce (GCM).
    #[serde(with = "bytes_field")]
    pub iv: Vec<u8>,
    /// The encrypted payload (including the tag for GCM).
    #[serde(with = "bytes_field")]
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Create an envelope header with an empty payload.
    pub fn new(
        kdf: KdfAlgorithm,
        cipher: CipherAlgorithm,
        salt: [u8; SALT_LENGTH],
        iv: Vec<u8>,
    ) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            kdf,
            cipher,
            salt: salt.to_vec(),
            iv,
            ciphertext: Vec::new(),
        }
    }

    /// Validate header fields and lengths.
    pub fn validate(&self) -> Result<()> {
        if self.version != ENVELOPE_VERSION {
            return Err(Error::VersionMismatch {
                expected: ENVELOPE_VERSION,
                found: self.version,
            });
        }
        if self.salt.len() != SALT_LENGTH {
            return Err(Error::format(format!(
                "Envelope salt must be {SALT_LENGTH} bytes, got {}",
                self.salt.len()
            )));
        }
        if self.iv.len() != self.cipher.iv_len() {
            return Err(Error::format(format!(
                "Envelope IV must be {} bytes, got {}",
                self.cipher.iv_len(),
                self.iv.len()
            )));
        }
        if self.ciphertext.is_empty() {
            return Err(Error::format("Envelope ciphertext is empty"));
        }
        self.kdf
            .validate()
            .map_err(|e| Error::format(format!("Envelope KDF: {e}")))
    }

    /// Salt as a fixed-size array.
    pub fn salt_array(&self) -> Result<[u8; SALT_LENGTH]> {
        self.salt.as_slice().try_into().map_err(|_| {
            Error::format(format!("Envelope salt must be {SALT_LENGTH} bytes"))
        })
    }

    /// Canonical header bytes authenticated alongside the payload.
    ///
    /// Layout: magic, version, kdf id, kdf params (u32 BE each), cipher id, salt, iv.
    pub fn associated_data(&self) -> Vec<u8> {
        let mut aad = Vec::with_capacity(32 + self.salt.len() + self.iv.len());
        aad.extend_from_slice(&ENVELOPE_MAGIC);
        aad.push(self.version);
        aad.push(self.kdf.id());
        for param in self.kdf.params() {
            aad.extend_from_slice(&param.to_be_bytes());
        }
        aad.push(self.cipher.id());
        aad.extend_from_slice(&self.salt);
        aad.extend_from_slice(&self.iv);
        aad
    }

    /// Serialize to the JSON text form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate the JSON text form.
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(json.trim())?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Serialize to the binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode_options().serialize(self)?;
        let mut out = Vec::with_capacity(ENVELOPE_MAGIC.len() + body.len());
        out.extend_from_slice(&ENVELOPE_MAGIC);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Parse and validate the binary form.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !Self::is_binary(data) {
            return Err(Error::InvalidMagic);
        }
        let envelope: Envelope = bincode_options().deserialize(&data[ENVELOPE_MAGIC.len()..])?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Whether `data` starts with the binary envelope magic.
    pub fn is_binary(data: &[u8]) -> bool {
        data.starts_with(&ENVELOPE_MAGIC)
    }
}

/// Fixed-width integers, and the body must fill the input exactly.
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Base64 strings in human-readable formats, raw bytes otherwise.
mod bytes_field {
    use crate::encoding::codec::{from_base64, to_base64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&to_base64(bytes))
        } else {
            serializer.collect_seq(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            from_base64(&encoded).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
