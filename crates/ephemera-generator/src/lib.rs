pub mod random;

pub use random::RandomGenerator;

use ephemera_core::PasteId;

/// Trait for generating paste identifiers.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness against stored rows is checked by the repository at insert
/// time, so a generator only has to make collisions unlikely.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> PasteId;

    /// Length of every identifier this generator produces.
    fn id_length(&self) -> usize;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    fn generate(&self) -> PasteId {
        (**self).generate()
    }

    fn id_length(&self) -> usize {
        (**self).id_length()
    }
}
