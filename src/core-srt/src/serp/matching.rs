//! Decides whether a search result belongs to the tracked domain.

/// Results past this position are never examined.
pub const MAX_RESULTS: usize = 100;

/// Strips the scheme and a leading `www.`, and lowercases.
pub fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.to_lowercase()
}

/// Host part of a result link: normalized, then cut at the first `/`.
pub fn result_host(link: &str) -> String {
    let normalized = normalize_domain(link);
    match normalized.split_once('/') {
        Some((host, _path)) => host.to_string(),
        None => normalized,
    }
}

/// Loose match: either side contains the other, so subdomains and parent domains both count.
/// An empty side never matches.
pub fn domains_match(target: &str, host: &str) -> bool {
    if target.is_empty() || host.is_empty() {
        return false;
    }
    host.contains(target) || target.contains(host)
}

/// 1-based position of the first result link matching `target_domain`, among the first [`MAX_RESULTS`].
pub fn find_rank<'a, I>(links: I, target_domain: &str) -> Option<i32>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = normalize_domain(target_domain);

    links
        .into_iter()
        .take(MAX_RESULTS)
        .position(|link| domains_match(&target, &result_host(link)))
        .map(|index| index as i32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://www.Example.com"), "example.com");
        assert_eq!(normalize_domain("http://example.com/path"), "example.com/path");
        assert_eq!(normalize_domain("blog.example.com"), "blog.example.com");
    }

    #[test]
    fn test_result_host() {
        assert_eq!(result_host("https://www.example.com/a/b?c=d"), "example.com");
        assert_eq!(result_host("https://shop.example.com"), "shop.example.com");
        assert_eq!(result_host(""), "");
    }

    #[test]
    fn test_subdomain_matches_both_ways() {
        assert!(domains_match("example.com", "blog.example.com"));
        assert!(domains_match("blog.example.com", "example.com"));
        assert!(!domains_match("example.com", "other.org"));
        assert!(!domains_match("example.com", ""));
    }

    #[test]
    fn test_find_rank_first_match() {
        let links = [
            "https://other.org/page",
            "https://www.example.com/one",
            "https://example.com/two",
        ];
        assert_eq!(find_rank(links, "example.com"), Some(2));
        assert_eq!(find_rank(links, "https://www.example.com"), Some(2));
    }

    #[test]
    fn test_find_rank_no_match() {
        let links = ["https://other.org", "https://another.net/x"];
        assert_eq!(find_rank(links, "example.com"), None);
        assert_eq!(find_rank(Vec::<&str>::new(), "example.com"), None);
    }

    #[test]
    fn test_find_rank_ignores_results_past_100() {
        let mut links: Vec<String> = (0..100).map(|i| format!("https://site{}.org/", i)).collect();
        links.push("https://example.com/".to_string());
        assert_eq!(find_rank(links.iter().map(String::as_str), "example.com"), None);

        links[99] = "https://example.com/".to_string();
        assert_eq!(find_rank(links.iter().map(String::as_str), "example.com"), Some(100));
    }

    #[test]
    fn test_find_rank_skips_empty_links() {
        let links = ["", "https://example.com/"];
        assert_eq!(find_rank(links, "example.com"), Some(2));
    }
}
