//! Core types and traits for the Ephemera paste store.
//!
//! This crate provides the shared vocabulary used by the storage backends,
//! the paste service, the reaper and the HTTP gateway: identifiers, the
//! repository contract, expiry policy and content validation.

pub mod clock;
pub mod error;
pub mod expiry;
pub mod paste_id;
pub mod pastebin;
pub mod repository;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, PasteError, StorageError};
pub use expiry::{ExpiryOption, ExpiryPolicy, DEFAULT_EXPIRY_KEY, EXPIRY_OPTIONS};
pub use paste_id::{validate_id_format, PasteId, DEFAULT_ID_LENGTH};
pub use pastebin::Pastebin;
pub use repository::{Paste, PasteReceipt, PasteStats, ReadRepository, Repository};
pub use validation::{validate_content, ContentRejection, ContentValidator, ValidationLimits};
