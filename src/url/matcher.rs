/// Checks if a host matches an allow-list pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact: "society.people.com.cn" matches only that host
/// 2. Wildcard: "*.people.com.cn" matches "people.com.cn" itself and any
///    subdomain of it, at any depth
///
/// Comparison ignores ASCII case.
///
/// # Examples
///
/// ```
/// use article_harvester::url::matches_wildcard;
///
/// assert!(matches_wildcard("society.people.com.cn", "society.people.com.cn"));
/// assert!(!matches_wildcard("society.people.com.cn", "legal.people.com.cn"));
///
/// assert!(matches_wildcard("*.people.com.cn", "people.com.cn"));
/// assert!(matches_wildcard("*.people.com.cn", "legal.people.com.cn"));
/// assert!(!matches_wildcard("*.people.com.cn", "people.com"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            if host.eq_ignore_ascii_case(base) {
                return true;
            }
            // Subdomain: host must end with ".{base}"
            host.len() > base.len()
                && host.as_bytes()[host.len() - base.len() - 1] == b'.'
                && host[host.len() - base.len()..].eq_ignore_ascii_case(base)
        }
        None => host.eq_ignore_ascii_case(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("society.people.com.cn", "society.people.com.cn"));
        assert!(matches_wildcard("127.0.0.1", "127.0.0.1"));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!matches_wildcard("society.people.com.cn", "legal.people.com.cn"));
        assert!(!matches_wildcard("people.com.cn", "society.people.com.cn"));
        assert!(!matches_wildcard("society.people.com.cn", "people.com.cn"));
    }

    #[test]
    fn test_wildcard_matches_bare_domain() {
        assert!(matches_wildcard("*.people.com.cn", "people.com.cn"));
    }

    #[test]
    fn test_wildcard_matches_subdomains() {
        assert!(matches_wildcard("*.people.com.cn", "society.people.com.cn"));
        assert!(matches_wildcard("*.people.com.cn", "img.legal.people.com.cn"));
    }

    #[test]
    fn test_wildcard_no_match_partial() {
        assert!(!matches_wildcard("*.people.com.cn", "notpeople.com.cn"));
        assert!(!matches_wildcard("*.people.com.cn", "people.com.cn.evil.org"));
        assert!(!matches_wildcard("*.people.com.cn", "com.cn"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_wildcard("society.people.com.cn", "Society.People.COM.cn"));
        assert!(matches_wildcard("*.people.com.cn", "LEGAL.PEOPLE.COM.CN"));
    }

    #[test]
    fn test_empty_host() {
        assert!(!matches_wildcard("*.people.com.cn", ""));
        assert!(!matches_wildcard("people.com.cn", ""));
    }

    #[test]
    fn test_non_ascii_host_does_not_panic() {
        assert!(!matches_wildcard("*.people.com.cn", "人民.people.com.c"));
        assert!(!matches_wildcard("*.cn", "é"));
    }
}
