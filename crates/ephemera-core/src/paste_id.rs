use crate::error::PasteError;
use serde::Serialize;
use std::fmt::Display;

/// Length of generated identifiers unless configured otherwise.
pub const DEFAULT_ID_LENGTH: usize = 8;

/// The URL-safe alphabet identifiers are drawn from.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// A paste identifier.
///
/// Identifiers are fixed-length and contain only ASCII letters, digits,
/// hyphens or underscores, so they can be embedded in a URL path as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PasteId(String);

impl PasteId {
    /// Parses an identifier received from a client.
    ///
    /// The identifier must be exactly `expected_len` characters long and use
    /// only the URL-safe alphabet.
    pub fn parse(id: impl Into<String>, expected_len: usize) -> Result<Self, PasteError> {
        let id = id.into();
        validate_id_format(&id, expected_len)?;
        Ok(Self(id))
    }

    /// Creates a `PasteId` without validation.
    ///
    /// Use this only for identifiers produced by trusted internal sources
    /// (a generator, or a row read back from storage).
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the public URL of the paste under `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PasteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that `id` has the exact expected length and only uses `[A-Za-z0-9_-]`.
pub fn validate_id_format(id: &str, expected_len: usize) -> Result<(), PasteError> {
    if id.len() != expected_len {
        return Err(PasteError::InvalidId(format!(
            "length must be {}, got {}",
            expected_len,
            id.len()
        )));
    }

    if !id.bytes().all(is_id_byte) {
        return Err(PasteError::InvalidId(
            "must contain only alphanumeric characters, hyphens, or underscores".to_string(),
        ));
    }

    Ok(())
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
