use std::sync::Arc;

use ephemera_core::validation::DEFAULT_MAX_CONTENT_BYTES;
use ephemera_core::{PasteId, Pastebin};
use ephemera_ratelimit::RateLimiters;
use typed_builder::TypedBuilder;

/// Room for the JSON framing around the content.
pub const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Worst-case growth of content once JSON-escaped: a control character
/// becomes a six-byte `\u00XX` escape.
pub const JSON_ESCAPE_FACTOR: usize = 6;

/// Largest request body that can carry `max_content_bytes` of content
/// however the client chooses to escape it.
pub const fn body_limit_for(max_content_bytes: usize) -> usize {
    max_content_bytes
        .saturating_mul(JSON_ESCAPE_FACTOR)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

#[derive(Clone, TypedBuilder)]
pub struct AppState {
    pastebin: Arc<dyn Pastebin>,
    #[builder(default = Arc::new(RateLimiters::default()))]
    limiters: Arc<RateLimiters>,
    /// Public origin, e.g. `https://paste.example.com`.
    #[builder(setter(into))]
    base_url: String,
    /// Largest accepted request body.
    #[builder(default = body_limit_for(DEFAULT_MAX_CONTENT_BYTES))]
    body_limit: usize,
    /// Key clients by `X-Forwarded-For`. Only safe behind a proxy that
    /// overwrites the header.
    #[builder(default = true)]
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn pastebin(&self) -> &dyn Pastebin {
        self.pastebin.as_ref()
    }

    pub fn limiters(&self) -> &RateLimiters {
        &self.limiters
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    /// Where a paste can be fetched from.
    pub fn paste_url(&self, id: &PasteId) -> String {
        id.to_url(&format!("{}/api/paste", self.base_url.trim_end_matches('/')))
    }
}
