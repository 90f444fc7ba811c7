//! Error types for passcrypt.

use thiserror::Error;

/// Result type alias for passcrypt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message used for every cipher-level decryption failure.
pub const DECRYPTION_FAILED_MESSAGE: &str = "Decryption failed: Invalid password or corrupted data";

/// Errors that can occur in passcrypt operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied structurally invalid input (empty text, missing salt, ...).
    #[error("{0}")]
    Validation(String),

    /// The encoded artifact or envelope is malformed.
    #[error("{0}")]
    Format(String),

    /// Wrong password or corrupted/tampered ciphertext.
    ///
    /// Carries no detail from the cipher layer.
    #[error("Decryption failed: Invalid password or corrupted data")]
    Decryption,

    /// Malformed input on the decrypt path (bad Base64, wrong salt length, ...).
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Unexpected failure on the encrypt path.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Key derivation parameters were rejected.
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Binary envelope does not start with the expected magic bytes.
    #[error("Invalid envelope: expected magic 'PCRY'")]
    InvalidMagic,

    /// Envelope version mismatch.
    #[error("Envelope version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },
}

/// Coarse classification of an [`Error`], for callers deciding what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Actionable input problem.
    Validation,
    /// Malformed artifact.
    Format,
    /// Wrong password or corrupted data.
    Decryption,
    /// Failure while encrypting.
    Encryption,
    /// Underlying I/O failure.
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Format(_)
            | Error::Serialization(_)
            | Error::InvalidMagic
            | Error::VersionMismatch { .. } => ErrorKind::Format,
            Error::Decryption | Error::DecryptionFailed(_) => ErrorKind::Decryption,
            Error::Encryption(_) | Error::KeyDerivation(_) => ErrorKind::Encryption,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Re-home an error raised on the decrypt path.
    ///
    /// Validation and cipher failures pass through untouched, everything else
    /// becomes [`Error::DecryptionFailed`] with the original message.
    pub(crate) fn into_decryption(self) -> Self {
        match self {
            Error::Validation(_) | Error::Decryption | Error::DecryptionFailed(_) => self,
            other => Error::DecryptionFailed(other.to_string()),
        }
    }

    /// Re-home an error raised on the encrypt path.
    pub(crate) fn into_encryption(self) -> Self {
        match self {
            Error::Validation(_) | Error::Encryption(_) => self,
            other => Error::Encryption(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
