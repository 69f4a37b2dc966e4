//! HTTP front end for the paste store.

pub mod app;
pub mod client;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod sweeper;

pub use app::App;
pub use state::AppState;
