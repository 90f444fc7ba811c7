//! Base64 and `salt:iv:ciphertext` artifact encoding.

use crate::encryptor::EncryptionResult;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Separator between the three artifact segments.
pub const ARTIFACT_SEPARATOR: char = ':';

const SEGMENT_COUNT_MESSAGE: &str =
    "Invalid encrypted data format. Expected format: salt:iv:encryptedData";

const SEGMENT_BASE64_MESSAGE: &str =
    "Invalid encrypted data format. Salt, IV, and encrypted data must be valid Base64 strings";

/// Encode bytes as standard, padded Base64.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard, padded Base64.
pub fn from_base64(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::format(format!("Invalid Base64: {e}")))
}

/// Join an [`EncryptionResult`] into `"{salt}:{iv}:{ciphertext}"`.
pub fn format(result: &EncryptionResult) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        result.salt,
        result.iv,
        result.ciphertext,
        sep = ARTIFACT_SEPARATOR
    )
}

/// Split a `salt:iv:ciphertext` artifact back into its Base64 parts.
///
/// Surrounding whitespace is ignored. Each segment must be non-empty and
/// valid Base64; the decoded bytes are not kept.
pub fn parse(artifact: &str) -> Result<EncryptionResult> {
    let parts: Vec<&str> = artifact.trim().split(ARTIFACT_SEPARATOR).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::format(SEGMENT_COUNT_MESSAGE));
    }

    for part in &parts {
        if from_base64(part).is_err() {
            return Err(Error::format(SEGMENT_BASE64_MESSAGE));
        }
    }

    Ok(EncryptionResult {
        salt: parts[0].to_string(),
        iv: parts[1].to_string(),
        ciphertext: parts[2].to_string(),
    })
}
