//! Hostname validation and overlap matching.
//!
//! Hostnames follow the Gateway API rules: RFC 1123 DNS names, no IP literals, optionally
//! prefixed by a single wildcard label (`*.`). The empty hostname means "any hostname".

use std::net::IpAddr;

const WILDCARD: &str = "*.";

/// Returns the canonical (lowercased) form of `host`, or `None` if it is not a valid hostname.
///
/// The empty string is valid and canonicalizes to itself.
pub fn canonicalize(host: &str) -> Option<String> {
    if host.is_empty() {
        return Some(String::new());
    }

    if host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let domain = host.strip_prefix(WILDCARD).unwrap_or(host);
    if !is_dns1123_domain(domain) {
        return None;
    }

    Some(host.to_ascii_lowercase())
}

/// Returns the most specific hostname matched by both `a` and `b`, if they overlap.
///
/// A pattern of the form `*.suffix` matches any hostname ending in `.suffix` (but not `suffix`
/// itself). An empty pattern matches anything, but two empty patterns never match: when neither
/// side names a host there is nothing to publish.
pub fn overlap(a: &str, b: &str) -> Option<String> {
    let a = canonicalize(a)?;
    let b = canonicalize(b)?;

    match (a.is_empty(), b.is_empty()) {
        (true, true) => return None,
        (true, false) => return Some(b),
        (false, true) => return Some(a),
        (false, false) if a == b => return Some(a),
        (false, false) => {}
    }

    // Order the pair so that `general` is the shorter pattern; on a length tie, the wildcard is
    // the more general of the two.
    let (general, specific) = if b.len() < a.len() || (a.len() == b.len() && b.starts_with(WILDCARD))
    {
        (b, a)
    } else {
        (a, b)
    };

    // `*.example.com` matches `foo.example.com` by its `.example.com` suffix.
    if general.starts_with(WILDCARD) && specific.ends_with(&general[1..]) {
        return Some(specific);
    }

    None
}

/// Returns whether `s` is a valid domain name according to RFC 1123.
fn is_dns1123_domain(s: &str) -> bool {
    if s.is_empty() || s.len() > 255 {
        return false;
    }
    s.split('.').all(is_dns1123_label)
}

/// Returns whether `s` is a valid domain label according to RFC 1123.
fn is_dns1123_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes {
        [] => false,
        _ if bytes.len() > 63 => false,
        [only] => only.is_ascii_alphanumeric(),
        [first, interior @ .., last] => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && interior.iter().all(|b| *b == b'-' || b.is_ascii_alphanumeric())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("", Some(""))]
    #[case::lowercased("API.Example.COM", Some("api.example.com"))]
    #[case::wildcard("*.Example.com", Some("*.example.com"))]
    #[case::single_label("localhost", Some("localhost"))]
    #[case::hyphenated("my-app.example.com", Some("my-app.example.com"))]
    #[case::ipv4("192.0.2.1", None)]
    #[case::ipv6("2001:db8::1", None)]
    #[case::bare_wildcard("*", None)]
    #[case::double_wildcard("*.*.example.com", None)]
    #[case::interior_wildcard("foo.*.example.com", None)]
    #[case::leading_hyphen("-foo.example.com", None)]
    #[case::trailing_hyphen("foo-.example.com", None)]
    #[case::empty_label("foo..example.com", None)]
    #[case::trailing_dot("example.com.", None)]
    #[case::underscore("foo_bar.example.com", None)]
    fn canonicalizes(#[case] host: &str, #[case] expected: Option<&str>) {
        assert_eq!(canonicalize(host).as_deref(), expected, "{host:?}");
    }

    #[test]
    fn rejects_long_labels() {
        let label = "a".repeat(63);
        assert!(canonicalize(&format!("{label}.example.com")).is_some());

        let label = "a".repeat(64);
        assert_eq!(canonicalize(&format!("{label}.example.com")), None);
    }

    #[test]
    fn rejects_long_domains() {
        // 64 labels of 3 characters plus separators is 255 characters.
        let domain = vec!["abc"; 64].join(".");
        assert_eq!(domain.len(), 255);
        assert!(canonicalize(&domain).is_some());

        let domain = format!("a{domain}");
        assert_eq!(domain.len(), 256);
        assert_eq!(canonicalize(&domain), None);
    }

    #[rstest]
    #[case::both_empty("", "", None)]
    #[case::any_left("", "api.example.com", Some("api.example.com"))]
    #[case::any_right("api.example.com", "", Some("api.example.com"))]
    #[case::equal("api.example.com", "api.example.com", Some("api.example.com"))]
    #[case::equal_case_insensitive("API.example.com", "api.EXAMPLE.com", Some("api.example.com"))]
    #[case::distinct("api.example.com", "www.example.com", None)]
    #[case::wildcard_left("*.example.com", "foo.example.com", Some("foo.example.com"))]
    #[case::wildcard_right("foo.example.com", "*.example.com", Some("foo.example.com"))]
    #[case::wildcard_deep("*.example.com", "a.b.example.com", Some("a.b.example.com"))]
    #[case::wildcard_excludes_apex("*.example.com", "example.com", None)]
    #[case::wildcard_partial_label("*.example.com", "fooexample.com", None)]
    #[case::wildcard_any("*.example.com", "", Some("*.example.com"))]
    #[case::wildcards_specific_wins("*.example.com", "*.foo.example.com", Some("*.foo.example.com"))]
    #[case::wildcards_specific_wins_reversed(
        "*.foo.example.com",
        "*.example.com",
        Some("*.foo.example.com")
    )]
    #[case::wildcards_disjoint("*.example.com", "*.example.org", None)]
    #[case::wildcard_same_length("*.example.com", "a.example.com", Some("a.example.com"))]
    #[case::same_length_reversed("a.example.com", "*.example.com", Some("a.example.com"))]
    #[case::ip_literals("192.0.2.1", "192.0.2.1", None)]
    #[case::invalid_left("-bad.example.com", "", None)]
    #[case::invalid_right("", "bad_.example.com", None)]
    fn overlaps(#[case] a: &str, #[case] b: &str, #[case] expected: Option<&str>) {
        assert_eq!(overlap(a, b).as_deref(), expected, "{a:?} ~ {b:?}");
    }

    #[test]
    fn overlap_is_symmetric() {
        let hosts = [
            "",
            "example.com",
            "foo.example.com",
            "*.example.com",
            "*.foo.example.com",
            "bar.foo.example.com",
        ];
        for a in hosts {
            for b in hosts {
                assert_eq!(overlap(a, b), overlap(b, a), "{a:?} ~ {b:?}");
            }
        }
    }
}
