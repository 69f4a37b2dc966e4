//! Background removal of expired pastes.
//!
//! [`Reaper`] periodically asks a repository to delete expired rows. It is
//! stopped through a [`Shutdown`] handle, which interrupts the sleep between
//! cycles but never a cycle in progress.

pub mod reaper;
pub mod shutdown;

pub use reaper::{Reaper, ReaperConfig, ReaperReport, ReaperState};
pub use shutdown::{wait_for_signal, Shutdown};
