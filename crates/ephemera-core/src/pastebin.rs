use crate::error::PasteError;
use crate::expiry::ExpiryPolicy;
use crate::repository::{Paste, PasteReceipt, PasteStats};
use async_trait::async_trait;

type Result<T> = std::result::Result<T, PasteError>;

/// The paste lifecycle operations offered to the HTTP layer.
#[async_trait]
pub trait Pastebin: Send + Sync + 'static {
    /// Validates `content`, allocates a fresh identifier and stores the paste.
    ///
    /// An unknown `expiry_key` falls back to the configured default expiry.
    async fn create_paste(&self, content: &str, expiry_key: &str) -> Result<PasteReceipt>;

    /// Returns a visible paste.
    ///
    /// Malformed ids yield `InvalidId`; expired and absent pastes both yield
    /// `NotFound`.
    async fn get_paste(&self, id: &str) -> Result<Paste>;

    /// Reports row counts from the underlying store.
    async fn stats(&self) -> Result<PasteStats>;

    /// The expiry options `create_paste` accepts and the default it falls back to.
    fn expiry_policy(&self) -> &ExpiryPolicy;
}
