//! Utility functions and helpers.

pub mod de;
pub mod http;

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative href against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href)?)
}

/// Parse a count out of text that may carry separators or labels
/// ("1,234 points"). Non-digit characters are stripped; anything left that
/// does not parse defaults to zero.
pub fn parse_count(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/hot").unwrap();
        assert_eq!(
            resolve_url(&base, "/funny").unwrap().as_str(),
            "https://example.com/funny"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x").unwrap().as_str(),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_parse_count_strips_noise() {
        assert_eq!(parse_count("1,234 points"), 1234);
        assert_eq!(parse_count("56"), 56);
    }

    #[test]
    fn test_parse_count_defaults_to_zero() {
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("no digits here"), 0);
    }
}
