use unicode_normalization::UnicodeNormalization;

/// Trim and NFC-normalize verse text so equal text compares equal
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.trim().nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_composes() {
        // "e" followed by a combining acute accent
        let decomposed = "  cafe\u{301} ";
        assert_eq!(normalize_text(decomposed), "caf\u{e9}");
    }
}
