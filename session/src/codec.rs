//! Reversible token obfuscation for values kept in browser storage and cookies.
//!
//! The encoded form is base64 of the token followed by a fixed public salt.
//! This keeps a bearer token from being readable at a glance in devtools; it is
//! not encryption and offers no protection against anyone with the salt, which
//! ships in every build. The external API remains the only authority on whether
//! a token is valid.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Suffix appended to the token before encoding.
pub const TOKEN_SALT: &str = "::wellness-admin::v1";

/// Error returned by [`reveal`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stored value is not valid base64.
    #[error("stored token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not UTF-8.
    #[error("stored token is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The decoded value does not end with [`TOKEN_SALT`].
    #[error("stored token is missing the salt suffix")]
    MissingSalt,
}

/// Encode a token for storage.
#[must_use]
pub fn obfuscate(token: &str) -> String {
    STANDARD.encode(format!("{token}{TOKEN_SALT}"))
}

/// Decode a value previously produced by [`obfuscate`].
///
/// # Errors
///
/// Returns [`CodecError`] when the value was not produced by [`obfuscate`].
pub fn reveal(encoded: &str) -> Result<String, CodecError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    let decoded = String::from_utf8(bytes)?;
    decoded
        .strip_suffix(TOKEN_SALT)
        .map(str::to_owned)
        .ok_or(CodecError::MissingSalt)
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
