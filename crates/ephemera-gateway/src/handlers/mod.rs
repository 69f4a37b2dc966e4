mod health;
mod paste;

pub use health::health_handler;
pub use paste::{create_paste_handler, expiry_options_handler, get_paste_handler};
