use http::HeaderValue;
use std::net::IpAddr;
use tracing::{info, warn};
use url::Url;

/// Browser origins the API answers cross-origin requests for.
///
/// An origin is allowed when it matches the configured public URL, one of
/// the extra allowed origins, or a loopback host on any port.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Vec<Url>,
}

impl CorsPolicy {
    pub fn new(public_url: Option<&str>, allowed_origins: &[String]) -> Self {
        let origins = public_url
            .into_iter()
            .chain(allowed_origins.iter().map(String::as_str))
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) => {
                    info!(origin = %raw, "CORS origin allowed");
                    Some(url)
                }
                Err(e) => {
                    warn!(origin = %raw, error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        Self { origins }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        let Some(url) = origin.to_str().ok().and_then(|s| Url::parse(s).ok()) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        is_loopback(host) || self.origins.iter().any(|allowed| same_origin(allowed, &url))
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

fn is_loopback(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(s: &'static str) -> HeaderValue {
        HeaderValue::from_static(s)
    }

    #[test]
    fn test_loopback_allowed() {
        let policy = CorsPolicy::default();
        assert!(policy.allows(&origin("http://localhost:5173")));
        assert!(policy.allows(&origin("http://127.0.0.1:3000")));
        assert!(policy.allows(&origin("http://[::1]:8080")));
    }

    #[test]
    fn test_public_url_exact_match() {
        let policy = CorsPolicy::new(Some("https://nolabites.com"), &[]);
        assert!(policy.allows(&origin("https://nolabites.com")));
        assert!(!policy.allows(&origin("http://nolabites.com")));
        assert!(!policy.allows(&origin("https://nolabites.com:8443")));
    }

    #[test]
    fn test_allowed_origins_list() {
        let extra = vec!["https://staging.nolabites.com".to_string(), "not a url".to_string()];
        let policy = CorsPolicy::new(None, &extra);
        assert!(policy.allows(&origin("https://staging.nolabites.com")));
        assert!(!policy.allows(&origin("https://evil.example")));
    }

    #[test]
    fn test_garbage_origin_rejected() {
        let policy = CorsPolicy::new(Some("https://nolabites.com"), &[]);
        assert!(!policy.allows(&origin("null")));
        assert!(!policy.allows(&origin("nolabites.com")));
    }
}
