//! Paste lifecycle service.
//!
//! [`PasteService`] ties a repository and an identifier generator together
//! behind the [`Pastebin`](ephemera_core::Pastebin) trait. Core types are
//! re-exported from `ephemera_core`.

pub mod service;

pub use ephemera_core::{Paste, PasteError, PasteReceipt, PasteStats, Pastebin};
pub use service::{PasteService, ServiceConfig, DEFAULT_MAX_ATTEMPTS};
