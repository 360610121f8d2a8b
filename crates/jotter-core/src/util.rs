//! Small text and time helpers shared by the adapters.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

const COMPACT_TEXT_LIMIT: usize = 180;

/// Squash whitespace runs and truncate for one-line error messages.
pub fn compact_text(value: &str) -> String {
    let squashed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    squashed.chars().take(COMPACT_TEXT_LIMIT).collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" https://example.com ".to_string())),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn compact_text_flattens_and_truncates() {
        assert_eq!(compact_text("  <html>\n  <body>oops</body>\n"), "<html> <body>oops</body>");
        assert_eq!(compact_text(&"x".repeat(500)).len(), COMPACT_TEXT_LIMIT);
        assert_eq!(compact_text(" \t "), "");
    }
}
