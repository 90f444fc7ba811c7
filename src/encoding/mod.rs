//! Transport encodings for encrypted payloads.
//!
//! This module provides:
//! - Base64 helpers and the `salt:iv:ciphertext` artifact
//! - The versioned [`Envelope`] in JSON and binary forms

mod codec;
mod envelope;

pub use codec::{format, from_base64, parse, to_base64, ARTIFACT_SEPARATOR};
pub use envelope::Envelope;
