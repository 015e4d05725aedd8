//! Client identification utilities
//!
//! Identifies the physical client behind a request: normalized IP address,
//! device fingerprint, and the per-request [`RequestContext`] that is passed
//! explicitly through every call instead of living in ambient state.

use axum::http::{HeaderMap, header};
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

use crate::crypto::{sha256, to_base64};
use crate::user_agent;

/// Normalize a client IP address for stable comparison.
///
/// IPv6 loopback becomes IPv4 loopback, and IPv6-mapped IPv4 addresses are
/// unwrapped to their dotted form, so the same physical client hashes
/// identically regardless of which stack the connection arrived on.
pub fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => ip,
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            } else if let Some(v4) = v6.to_ipv4_mapped() {
                IpAddr::V4(v4)
            } else {
                ip
            }
        }
    }
}

/// Extract the client IP address from headers.
///
/// Checks `X-Forwarded-For` first (reverse proxy setups), then falls back to
/// the direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Stable hash identifying the physical client making a request.
///
/// Tokens carry this value as a claim at mint time; validation recomputes it
/// from the live request and rejects on mismatch, which catches tokens
/// replayed from a different device.
pub struct DeviceFingerprint;

impl DeviceFingerprint {
    /// Derive the fingerprint from the User-Agent header and normalized IP.
    ///
    /// Pure function: same inputs, same output, no I/O. The hashed material
    /// is the parsed device class, the raw header, the parsed OS, and the
    /// normalized IP, all lowercased and joined with a fixed separator. An
    /// unparsable header degrades to the `"Unknown"` triple rather than
    /// failing.
    pub fn compute(user_agent: Option<&str>, remote_ip: Option<IpAddr>) -> String {
        let client = user_agent::parse(user_agent.unwrap_or(""));

        let mut parts: Vec<String> = Vec::with_capacity(4);
        parts.push(client.device.to_ascii_lowercase());
        if let Some(ua) = user_agent {
            let ua = ua.trim().to_ascii_lowercase();
            if !ua.is_empty() {
                parts.push(ua);
            }
        }
        parts.push(client.os.to_ascii_lowercase());
        if let Some(ip) = remote_ip {
            parts.push(normalize_ip(ip).to_string().to_ascii_lowercase());
        }

        let joined = parts.join(":");
        to_base64(&sha256(joined.as_bytes()))
    }
}

/// Facts about the current request, derived once and passed by parameter.
///
/// Replaces ambient HTTP-context accessors: everything the session core needs
/// to know about "this request" travels in this struct.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw User-Agent header, if present
    pub user_agent: Option<String>,
    /// Normalized client IP
    pub ip_address: Option<IpAddr>,
    /// Device fingerprint derived from user agent + IP
    pub device_id: String,
    /// scheme + host the request was addressed to, e.g. `https://api.example.com`
    pub issuer: Option<String>,
    /// Origin/Referer host of the caller, e.g. `app.example.com`
    pub audience: Option<String>,
    /// Authenticated user, populated after token validation
    pub user_id: Option<Uuid>,
}

impl RequestContext {
    /// Build the context from request headers and the connection IP.
    pub fn from_request(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let ip_address = extract_client_ip(headers, direct_ip).map(normalize_ip);
        let device_id = DeviceFingerprint::compute(user_agent.as_deref(), ip_address);

        Self {
            user_agent,
            ip_address,
            device_id,
            issuer: request_issuer(headers),
            audience: request_audience(headers),
            user_id: None,
        }
    }

    /// Attach the authenticated user once the principal is known.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// scheme + host the request was addressed to.
fn request_issuer(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok())?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim())
        .unwrap_or("http");
    Some(format!("{}://{}", proto, host.to_ascii_lowercase()))
}

/// Origin host of the caller, falling back to the Referer host.
fn request_audience(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .and_then(url_host)
        .or_else(|| {
            headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .and_then(url_host)
        })
}

/// Authority part of a URL, lowercased, without userinfo or path.
fn url_host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
