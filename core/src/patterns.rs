//! Classifiers for "interesting" constant-pool strings.

/// Position of `needle` in `haystack`, ignoring ASCII case
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_lowercase()
        .find(needle.to_lowercase().as_str())
}

/// True when the string carries a URL scheme somewhere inside it
pub fn is_url(candidate: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "ftps://"];

    SCHEMES
        .iter()
        .any(|scheme| find_case_insensitive(candidate, scheme).is_some())
}

/// True for `local@domain` shapes where the domain carries an interior dot
pub fn is_email(candidate: &str) -> bool {
    let mut parts = candidate.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || domain.len() < 3 {
        return false;
    }

    // the dot must separate two non-empty labels
    domain
        .find('.')
        .is_some_and(|pos| pos > 0 && pos < domain.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_match_known_schemes() {
        assert!(is_url("http://example.com"));
        assert!(is_url("see HTTPS://example.com/page"));
        assert!(is_url("ftp://x"));
        assert!(!is_url("mailto:a@b.c"));
        assert!(!is_url("just a string"));
    }

    #[test]
    fn emails_require_local_part_and_dotted_domain() {
        assert!(is_email("name@domain.co"));
        assert!(!is_email("@lead"));
        assert!(!is_email("a@b"));
        assert!(!is_email("two@at@signs.com"));
        assert!(!is_email("dot@.leading"));
    }

    #[test]
    fn search_is_case_insensitive() {
        assert_eq!(find_case_insensitive("Hello World", "world"), Some(6));
        assert_eq!(find_case_insensitive("HELLO", "hello"), Some(0));
        assert_eq!(find_case_insensitive("abc", "xyz"), None);
    }
}
