//! `Host` header allow-list.
//!
//! When `STOREFRONT_ALLOWED_HOSTS` is set, requests for any other host are
//! rejected with 400 before they reach a handler. An empty list allows all.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::HOST},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Whether `host` (with or without a port) matches an allow-list entry.
///
/// An entry starting with `.` matches the domain and all its subdomains.
#[must_use]
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let host = strip_port(host).to_ascii_lowercase();
    allowed.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        if entry == "*" {
            return true;
        }
        match entry.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&entry),
            None => host == entry,
        }
    })
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, e.g. "[::1]:3000"
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

/// Reject requests whose `Host` header is not allowed.
pub async fn allowed_hosts_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.config().allowed_hosts;
    if allowed.is_empty() {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default();

    if host_allowed(host, allowed) {
        next.run(request).await
    } else {
        tracing::warn!(host, "Rejected request for disallowed host");
        (StatusCode::BAD_REQUEST, "Bad Request (400)").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_list_allows_all() {
        assert!(host_allowed("anything.example", &[]));
    }

    #[test]
    fn test_exact_match_ignores_port_and_case() {
        let allowed = hosts(&["shop.example.dz"]);
        assert!(host_allowed("shop.example.dz", &allowed));
        assert!(host_allowed("SHOP.example.dz:443", &allowed));
        assert!(!host_allowed("evil.example", &allowed));
    }

    #[test]
    fn test_subdomain_wildcard() {
        let allowed = hosts(&[".example.dz"]);
        assert!(host_allowed("example.dz", &allowed));
        assert!(host_allowed("www.example.dz", &allowed));
        assert!(!host_allowed("badexample.dz", &allowed));
    }

    #[test]
    fn test_ipv6_literal() {
        let allowed = hosts(&["::1"]);
        assert!(host_allowed("[::1]:3000", &allowed));
    }
}
