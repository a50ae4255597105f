use serde::{Deserialize, Serialize};

/// A canonical bible book from the book catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookRef {
    /// Numeric id, also the leading three digits of every reference id in this book
    pub book_id: u32,

    /// Three-character code, lowercase (e.g. "gen", "1co")
    pub book_code: String,

    /// Human-readable name
    pub book_name: String,
}

impl BookRef {
    pub fn new(book_id: u32, book_code: impl Into<String>, book_name: impl Into<String>) -> Self {
        Self {
            book_id,
            book_code: normalize_book_code(&book_code.into()),
            book_name: book_name.into(),
        }
    }
}

impl std::fmt::Display for BookRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.book_code)
    }
}

/// Canonical form of a book code: trimmed and lowercase.
#[must_use]
pub fn normalize_book_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Name of a bible resource, e.g. `en_KJV_1_bible`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(pub String);

impl ResourceName {
    /// Suffix carried by every bible resource name
    pub const BIBLE_SUFFIX: &'static str = "_bible";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Bible resources are recognised by their `_bible` suffix
    #[must_use]
    pub fn is_bible(&self) -> bool {
        self.0.len() > Self::BIBLE_SUFFIX.len() && self.0.ends_with(Self::BIBLE_SUFFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shape of a verse-number token as it appears in source content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerseShape {
    /// A plain verse number, `N`
    Normal,
    /// One fragment of a verse split across entries, `N<suffix>`
    Split,
    /// A range of verses published as one entry, `N-M`
    Merged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_code_is_lowercased() {
        let book = BookRef::new(1, " GEN ", "Genesis");
        assert_eq!(book.book_code, "gen");
        assert_eq!(book.to_string(), "gen");
    }

    #[test]
    fn test_resource_name_is_bible() {
        assert!(ResourceName::new("en_KJV_1_bible").is_bible());
        assert!(!ResourceName::new("en_KJV_1_commentary").is_bible());
        assert!(!ResourceName::new("_bible").is_bible());
    }
}
