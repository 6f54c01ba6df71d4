//! Text normalization helpers shared by query building, article identity
//! and cache keys.

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key form of request text: whitespace-collapsed and lower-cased.
///
/// Two requests that differ only in case or spacing share a key.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Lower-case, drop punctuation, collapse whitespace.
pub fn strip_punctuation(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    collapse_whitespace(&kept)
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Breaking\n\tNEWS   today "), "breaking news today");
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("U.S. Senate: passes   bill!"), "us senate passes bill");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 80), "short");
    }
}
