use url::Url;

/// Checks whether two URLs point at the same host
///
/// Hosts are compared case-insensitively and ports by their effective value,
/// so `https://example.com` and `https://EXAMPLE.com:443` are the same host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use flowbake::url::same_host;
///
/// let a = Url::parse("https://example.com/about").unwrap();
/// let b = Url::parse("https://EXAMPLE.com:443/").unwrap();
/// assert!(same_host(&a, &b));
/// ```
pub fn same_host(a: &Url, b: &Url) -> bool {
    let host = |url: &Url| url.host_str().map(|h| h.to_lowercase());

    host(a).is_some() && host(a) == host(b) && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_host_simple() {
        assert!(same_host(&url("https://example.com/a"), &url("https://example.com/b")));
    }

    #[test]
    fn test_subdomain_differs() {
        assert!(!same_host(&url("https://blog.example.com/"), &url("https://example.com/")));
    }

    #[test]
    fn test_port_differs() {
        assert!(!same_host(&url("http://127.0.0.1:8080/"), &url("http://127.0.0.1:9090/")));
    }

    #[test]
    fn test_default_port_matches() {
        assert!(same_host(&url("https://example.com:443/"), &url("https://example.com/")));
    }

    #[test]
    fn test_mixed_case() {
        assert!(same_host(&url("https://Example.COM/"), &url("https://example.com/")));
    }

    #[test]
    fn test_no_host() {
        assert!(!same_host(&url("mailto:a@example.com"), &url("mailto:a@example.com")));
    }
}
