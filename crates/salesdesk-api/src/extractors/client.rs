//! Client address and user agent of the current request.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use salesdesk_entity::session::SessionMetadata;

use crate::state::AppState;

/// Client identification. The socket peer address is used unless
/// `server.trust_forwarded_headers` is set, in which case the first
/// `x-forwarded-for` hop wins, then `x-real-ip`, then the peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo(pub SessionMetadata);

impl ClientInfo {
    pub fn metadata(&self) -> &SessionMetadata {
        &self.0
    }

    /// Key used for per-client rate limiting.
    pub fn rate_limit_key(&self) -> &str {
        self.0.ip_address.as_deref().unwrap_or("unknown")
    }

    pub fn from_parts(parts: &Parts, trust_forwarded: bool) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let forwarded = trust_forwarded
            .then(|| forwarded_ip(&parts.headers))
            .flatten();
        Self(SessionMetadata {
            user_agent: header(&parts.headers, USER_AGENT.as_str()),
            ip_address: forwarded.or(peer),
        })
    }
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.config.server.trust_forwarded_headers))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header(headers, "x-real-ip"))
}
