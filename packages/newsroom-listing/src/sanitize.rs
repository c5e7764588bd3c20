//! Search input sanitizing

/// Characters removed from search input
pub const STRIPPED_CHARS: &[char] = &[
    '`', '%', '$', '^', '*', '(', ')', '_', '+', '=', '[', ']', '{', '}', '\\', '|', '<', '>',
    '/', '~', '!', '@', '#', '&',
];

/// Default maximum query length, matching the search input's `maxlength`
pub const DEFAULT_MAX_QUERY_CHARS: usize = 60;

/// Normalize raw search input
///
/// Removes every character of `STRIPPED_CHARS`, keeps the first 60
/// characters, then trims surrounding whitespace. Total: never fails, and
/// `sanitize_query(Some(&sanitize_query(x)))` equals `sanitize_query(x)`.
pub fn sanitize_query(raw: Option<&str>) -> String {
    sanitize_query_with_limit(raw, DEFAULT_MAX_QUERY_CHARS)
}

pub fn sanitize_query_with_limit(raw: Option<&str>, max_chars: usize) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let kept: String = raw
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .take(max_chars)
        .collect();
    kept.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_none_is_empty() {
        assert_eq!(sanitize_query(None), "");
    }

    #[test]
    fn test_strips_special_characters() {
        assert_eq!(
            sanitize_query(Some("<script>alert(1)</script>")),
            "scriptalert1script"
        );
        assert_eq!(sanitize_query(Some("100% a&b c_d")), "100 ab cd");
    }

    #[test]
    fn test_keeps_ordinary_punctuation() {
        assert_eq!(sanitize_query(Some("covid-19, vaccine.")), "covid-19, vaccine.");
    }

    #[test]
    fn test_truncates_before_trimming() {
        let raw = format!("  {}", "a".repeat(70));
        let out = sanitize_query(Some(&raw));
        // two leading spaces count toward the 60
        assert_eq!(out, "a".repeat(58));
    }

    #[test]
    fn test_removal_happens_before_truncation() {
        let raw = format!("{}{}", "#".repeat(30), "b".repeat(60));
        assert_eq!(sanitize_query(Some(&raw)), "b".repeat(60));
    }

    #[test]
    fn test_custom_limit() {
        assert_eq!(sanitize_query_with_limit(Some("hello world"), 5), "hello");
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in any::<String>()) {
            let once = sanitize_query(Some(&input));
            let twice = sanitize_query(Some(&once));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_sanitize_length_bound(input in any::<String>()) {
            prop_assert!(sanitize_query(Some(&input)).chars().count() <= 60);
        }

        #[test]
        fn prop_sanitize_output_has_no_stripped_chars(input in ".*") {
            let out = sanitize_query(Some(&input));
            prop_assert!(!out.chars().any(|c| STRIPPED_CHARS.contains(&c)));
        }
    }
}
