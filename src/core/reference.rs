//! Reference ids: a single integer per verse that sorts in reading order.
//!
//! A reference is packed as `BBBCCCVVV` (book, chapter, verse; three decimal
//! digits each). Because every component is fixed width, comparing two ids
//! compares book first, then chapter, then verse, so a passage that crosses
//! chapter or book boundaries is still the closed interval `start..=end`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest value any single component may take
pub const MAX_COMPONENT: u32 = 999;

/// Width of the zero-padded string key
pub const KEY_WIDTH: usize = 9;

const BOOK_FACTOR: u32 = 1_000_000;
const CHAPTER_FACTOR: u32 = 1_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Reference out of range: {component} {value} is outside 0..={MAX_COMPONENT}")]
    Range { component: &'static str, value: i64 },

    #[error("Malformed reference id '{0}': expected a book of 1..=999 followed by six digits")]
    Format(String),
}

/// Book, chapter and verse of a single verse position.
///
/// Field order matters: the derived `Ord` is reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    pub book: u32,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub fn new(book: u32, chapter: u32, verse: u32) -> Self {
        Self {
            book,
            chapter,
            verse,
        }
    }

    /// Encode this position as a reference id
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Range` if any component is above 999 or the book is 0.
    pub fn encode(self) -> Result<ReferenceId, CodecError> {
        encode(self.book, self.chapter, self.verse)
    }
}

impl TryFrom<(i64, i64, i64)> for VerseRef {
    type Error = CodecError;

    fn try_from((book, chapter, verse): (i64, i64, i64)) -> Result<Self, Self::Error> {
        let book = checked_component("book", book)?;
        let chapter = checked_component("chapter", chapter)?;
        let verse = checked_component("verse", verse)?;
        Ok(Self::new(book, chapter, verse))
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03} {}:{}", self.book, self.chapter, self.verse)
    }
}

fn checked_component(component: &'static str, value: i64) -> Result<u32, CodecError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_COMPONENT)
        .ok_or(CodecError::Range { component, value })
}

/// Totally-ordered integer key of a verse position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(u32);

impl ReferenceId {
    /// Validate a raw integer id
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Format` if the id does not have 7 to 9 digits.
    pub fn from_raw(raw: u64) -> Result<Self, CodecError> {
        if !(u64::from(BOOK_FACTOR)..=999_999_999).contains(&raw) {
            return Err(CodecError::Format(raw.to_string()));
        }
        // Range check above guarantees the value fits
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(raw as u32))
    }

    /// Parse the fixed-width string key produced by [`ReferenceId::to_key`]
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Format` unless the key is exactly nine ASCII digits
    /// with a non-zero book component.
    pub fn from_key(key: &str) -> Result<Self, CodecError> {
        if key.len() != KEY_WIDTH || !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::Format(key.to_string()));
        }
        let raw: u64 = key
            .parse()
            .map_err(|_| CodecError::Format(key.to_string()))?;
        Self::from_raw(raw)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Zero-padded `BBBCCCVVV` form
    #[must_use]
    pub fn to_key(self) -> String {
        format!("{:09}", self.0)
    }

    #[must_use]
    pub fn book(self) -> u32 {
        self.0 / BOOK_FACTOR
    }

    #[must_use]
    pub fn chapter(self) -> u32 {
        (self.0 / CHAPTER_FACTOR) % CHAPTER_FACTOR
    }

    #[must_use]
    pub fn verse(self) -> u32 {
        self.0 % CHAPTER_FACTOR
    }

    #[must_use]
    pub fn verse_ref(self) -> VerseRef {
        VerseRef::new(self.book(), self.chapter(), self.verse())
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReferenceId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == KEY_WIDTH {
            return Self::from_key(s);
        }
        let raw: u64 = s.parse().map_err(|_| CodecError::Format(s.to_string()))?;
        Self::from_raw(raw)
    }
}

/// Encode a (book, chapter, verse) triple as a reference id.
///
/// # Errors
///
/// Returns `CodecError::Range` if the book is 0 or any component exceeds 999.
/// Values are never clamped.
pub fn encode(book: u32, chapter: u32, verse: u32) -> Result<ReferenceId, CodecError> {
    if book == 0 || book > MAX_COMPONENT {
        return Err(CodecError::Range {
            component: "book",
            value: i64::from(book),
        });
    }
    if chapter > MAX_COMPONENT {
        return Err(CodecError::Range {
            component: "chapter",
            value: i64::from(chapter),
        });
    }
    if verse > MAX_COMPONENT {
        return Err(CodecError::Range {
            component: "verse",
            value: i64::from(verse),
        });
    }
    Ok(ReferenceId(book * BOOK_FACTOR + chapter * CHAPTER_FACTOR + verse))
}

/// Decode a raw integer id back into its components.
///
/// # Errors
///
/// Returns `CodecError::Format` if the id does not have 7 to 9 digits.
pub fn decode(raw: u64) -> Result<VerseRef, CodecError> {
    ReferenceId::from_raw(raw).map(ReferenceId::verse_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_packs_components() {
        let id = encode(1, 2, 3).unwrap();
        assert_eq!(id.value(), 1_002_003);
        assert_eq!(id.to_key(), "001002003");
    }

    #[test]
    fn test_decode_is_inverse_of_encode() {
        for &(b, c, v) in &[(1, 0, 0), (1, 1, 1), (40, 5, 17), (66, 22, 21), (999, 999, 999)] {
            let id = encode(b, c, v).unwrap();
            assert_eq!(decode(u64::from(id.value())).unwrap(), VerseRef::new(b, c, v));
            assert_eq!(ReferenceId::from_key(&id.to_key()).unwrap(), id);
        }
    }

    #[test]
    fn test_encode_is_monotonic_across_boundaries() {
        let ordered = [
            VerseRef::new(1, 1, 31),
            VerseRef::new(1, 2, 1),
            VerseRef::new(1, 50, 26),
            VerseRef::new(2, 1, 1),
            VerseRef::new(2, 1, 999),
            VerseRef::new(2, 2, 0),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].encode().unwrap() < pair[1].encode().unwrap());
        }
    }

    #[test]
    fn test_encode_rejects_overflow() {
        assert!(matches!(
            encode(1, 1000, 1),
            Err(CodecError::Range { component: "chapter", value: 1000 })
        ));
        assert!(matches!(
            encode(1, 1, 1000),
            Err(CodecError::Range { component: "verse", .. })
        ));
        assert!(matches!(
            encode(0, 1, 1),
            Err(CodecError::Range { component: "book", .. })
        ));
    }

    #[test]
    fn test_negative_components_are_range_errors() {
        let err = VerseRef::try_from((1, -1, 3)).unwrap_err();
        assert_eq!(
            err,
            CodecError::Range {
                component: "chapter",
                value: -1
            }
        );
        assert!(VerseRef::try_from((1, 1, -5)).is_err());
        assert_eq!(VerseRef::try_from((1, 2, 3)).unwrap(), VerseRef::new(1, 2, 3));
    }

    #[test]
    fn test_decode_rejects_wrong_digit_count() {
        assert!(matches!(decode(12_345), Err(CodecError::Format(_))));
        assert!(matches!(decode(1_000_000_000), Err(CodecError::Format(_))));
        assert!(ReferenceId::from_key("00100200").is_err());
        assert!(ReferenceId::from_key("0010020x3").is_err());
        assert!(ReferenceId::from_key("000001001").is_err());
    }

    #[test]
    fn test_parse_accepts_raw_and_key_forms() {
        let id: ReferenceId = "001002003".parse().unwrap();
        assert_eq!(id.value(), 1_002_003);
        let id: ReferenceId = "43003016".parse().unwrap();
        assert_eq!(id.verse_ref(), VerseRef::new(43, 3, 16));
    }
}
