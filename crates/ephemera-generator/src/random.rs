use crate::Generator;
use ephemera_core::paste_id::ALPHABET;
use ephemera_core::{CoreError, PasteId, DEFAULT_ID_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;

const MAX_LENGTH: usize = 64;

/// Draws identifiers uniformly from the URL-safe alphabet using the OS RNG.
///
/// Each character carries six bits of entropy, so the default eight
/// characters give 2^48 possible identifiers.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator for identifiers of `length` characters.
    pub fn new(length: usize) -> Result<Self, CoreError> {
        if length == 0 || length > MAX_LENGTH {
            return Err(CoreError::InvalidIdLength(length));
        }
        Ok(Self { length })
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_ID_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    /// # Panics
    ///
    /// Panics if the operating system's entropy source fails. There is no
    /// safe way to keep issuing identifiers without it.
    fn generate(&self) -> PasteId {
        let mut bytes = [0u8; MAX_LENGTH];
        let bytes = &mut bytes[..self.length];
        OsRng.fill_bytes(bytes);

        // 256 is a multiple of the alphabet size, so masking keeps the draw uniform
        let id: String = bytes
            .iter()
            .map(|b| ALPHABET[usize::from(b & 0x3f)] as char)
            .collect();
        PasteId::new_unchecked(id)
    }

    fn id_length(&self) -> usize {
        self.length
    }
}
