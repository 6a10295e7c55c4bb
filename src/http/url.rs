//! External URL assembly.
//!
//! # Responsibilities
//! - Infer whether a request was originally made over HTTPS, even behind a
//!   trusted proxy
//! - Resolve the externally visible port
//! - Turn a generated path into a protocol-relative or absolute URL
//!
//! # Design Decisions
//! - `X-Forwarded-*` headers are only honored when proxy trust is enabled
//! - Port/scheme precedence: trusted proxy header, then the configured
//!   external port, then the listener port
//! - URLs are protocol-relative unless the caller knows the request scheme

use axum::http::HeaderMap;

use crate::config::ServerConfig;

/// Whether the request behind `headers` was originally made via HTTPS.
///
/// Without proxy trust this always returns false; TLS termination is not
/// part of this process.
pub fn infer_secure(headers: &HeaderMap, trust_proxy: bool) -> bool {
    if !trust_proxy {
        return false;
    }

    if let Some(proto) = headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()) {
        if proto.eq_ignore_ascii_case("https") {
            return true;
        }
    }

    forwarded_port(headers, trust_proxy) == Some(443)
}

/// The port a trusted proxy reports the client connected to.
pub fn forwarded_port(headers: &HeaderMap, trust_proxy: bool) -> Option<u16> {
    if !trust_proxy {
        return None;
    }
    headers
        .get("x-forwarded-port")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Externally visible port: trusted proxy header first, then the configured
/// external port, then the listener port.
pub fn external_port(server: &ServerConfig, forwarded: Option<u16>) -> u16 {
    forwarded
        .or(server.external_port)
        .unwrap_or_else(|| listen_port(server))
}

fn listen_port(server: &ServerConfig) -> u16 {
    server
        .bind_address
        .rsplit(':')
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(80)
}

/// Build an absolute URL for `path`.
///
/// `secure` of `None` yields a protocol-relative URL. The port is appended
/// only when the externally visible port is neither 80 nor 443.
pub fn absolute_url(
    server: &ServerConfig,
    path: &str,
    secure: Option<bool>,
    forwarded: Option<u16>,
) -> String {
    let mut url = String::new();
    match secure {
        Some(true) => url.push_str("https://"),
        Some(false) => url.push_str("http://"),
        None => url.push_str("//"),
    }
    url.push_str(&server.host);

    let port = external_port(server, forwarded);
    if port != 80 && port != 443 {
        url.push(':');
        url.push_str(&port.to_string());
    }

    url.push_str(path);
    url
}
