use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Identifies the caller for rate limiting.
///
/// Uses the first `X-Forwarded-For` entry when the proxy header is trusted,
/// then the peer address, then `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

pub fn client_key(
    headers: &HeaderMap,
    peer: Option<&SocketAddr>,
    trust_forwarded_for: bool,
) -> ClientKey {
    let key = trust_forwarded_for
        .then(|| forwarded_for(headers))
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    ClientKey(key)
}

impl FromRequestParts<AppState> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr);
        Ok(client_key(&parts.headers, peer, state.trust_forwarded_for()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.7:51000".parse().unwrap()
    }

    #[test]
    fn prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"),
        );

        assert_eq!(
            client_key(&headers, Some(&peer()), true).as_str(),
            "203.0.113.9"
        );
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(""));

        assert_eq!(
            client_key(&headers, Some(&peer()), true).as_str(),
            "192.0.2.7"
        );
    }

    #[test]
    fn unknown_without_any_source() {
        assert_eq!(client_key(&HeaderMap::new(), None, true).as_str(), "unknown");
    }

    #[test]
    fn untrusted_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"));

        assert_eq!(
            client_key(&headers, Some(&peer()), false).as_str(),
            "192.0.2.7"
        );
        assert_eq!(client_key(&headers, None, false).as_str(), "unknown");
    }
}
