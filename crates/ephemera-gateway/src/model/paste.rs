use ephemera_core::{ExpiryOption, Paste, PasteId};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreatePasteRequest {
    pub content: String,
    /// One of the expiry keys; unknown or missing keys use the default.
    #[serde(default)]
    pub expiry: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePasteResponse {
    pub id: String,
    pub url: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasteResponse {
    pub id: String,
    pub content: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<Paste> for PasteResponse {
    fn from(paste: Paste) -> Self {
        Self {
            id: paste.id.to_string(),
            content: paste.content,
            created_at: paste.created_at,
            expires_at: paste.expires_at,
        }
    }
}

impl CreatePasteResponse {
    pub fn new(id: &PasteId, url: String, expires_at: Timestamp) -> Self {
        Self {
            id: id.to_string(),
            url,
            expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpiryOptionView {
    pub key: String,
    pub label: String,
    pub seconds: u64,
}

impl From<&ExpiryOption> for ExpiryOptionView {
    fn from(option: &ExpiryOption) -> Self {
        Self {
            key: option.key.to_string(),
            label: option.label.to_string(),
            seconds: option.duration.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpiryOptionsResponse {
    pub options: Vec<ExpiryOptionView>,
    pub default: String,
}
