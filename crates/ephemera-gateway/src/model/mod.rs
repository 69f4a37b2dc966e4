mod health;
mod paste;

pub use health::HealthResponse;
pub use paste::{
    CreatePasteRequest, CreatePasteResponse, ExpiryOptionView, ExpiryOptionsResponse,
    PasteResponse,
};
