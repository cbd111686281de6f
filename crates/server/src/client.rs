use std::convert::Infallible;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use service::session::ClientInfo;

/// Longest value stored in `sessions.ip`.
const MAX_IP_LEN: usize = 64;
const MAX_USER_AGENT_LEN: usize = 512;

/// Caller address and user agent. Taken from `X-Forwarded-For` when present,
/// which any client can forge, so it is only ever recorded.
pub struct ClientMeta(pub ClientInfo);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
        Ok(ClientMeta(client_info(&parts.headers, peer)))
    }
}

pub fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let ip = forwarded_for(headers)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| truncate(ua, MAX_USER_AGENT_LEN));
    ClientInfo::new(ip, user_agent)
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| truncate(first, MAX_IP_LEN))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
