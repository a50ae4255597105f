use serde::{Deserialize, Serialize};

use crate::core::reference::{encode, CodecError, ReferenceId};

/// A verse entry exactly as it was published in the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedVerse {
    /// Original verse-number token (e.g. "23a", "5-7")
    pub verse_number: String,
    pub verse_text: String,
}

impl PublishedVerse {
    pub fn new(verse_number: impl Into<String>, verse_text: impl Into<String>) -> Self {
        Self {
            verse_number: verse_number.into(),
            verse_text: verse_text.into(),
        }
    }
}

/// Audit metadata kept on rows that came from split or merged source entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseMetadata {
    #[serde(default)]
    pub published_versification: Vec<PublishedVerse>,
}

impl VerseMetadata {
    pub fn published(entry: PublishedVerse) -> Self {
        Self {
            published_versification: vec![entry],
        }
    }
}

/// The single persisted representation of one verse position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalVerseRow {
    pub book_id: u32,
    pub chapter: u32,
    pub verse_number: u32,
    pub verse_text: String,

    #[serde(rename = "metaData", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VerseMetadata>,
}

impl CanonicalVerseRow {
    pub fn new(book_id: u32, chapter: u32, verse_number: u32, verse_text: impl Into<String>) -> Self {
        Self {
            book_id,
            chapter,
            verse_number,
            verse_text: verse_text.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: VerseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Reference id of this row's position
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Range` if the chapter or verse number exceeds 999.
    pub fn reference_id(&self) -> Result<ReferenceId, CodecError> {
        encode(self.book_id, self.chapter, self.verse_number)
    }

    /// Whether this row sits at the same (book, chapter, verse) position
    #[must_use]
    pub fn same_position(&self, book_id: u32, chapter: u32, verse_number: u32) -> bool {
        self.book_id == book_id && self.chapter == chapter && self.verse_number == verse_number
    }

    /// Published source entries recorded for this row, if any
    pub fn published_versification(&self) -> &[PublishedVerse] {
        self.metadata
            .as_ref()
            .map_or(&[], |m| m.published_versification.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_with_camel_case_fields() {
        let row = CanonicalVerseRow::new(1, 1, 5, "text")
            .with_metadata(VerseMetadata::published(PublishedVerse::new("5-7", "text")));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["bookId"], 1);
        assert_eq!(json["verseNumber"], 5);
        assert_eq!(
            json["metaData"]["publishedVersification"][0]["verseNumber"],
            "5-7"
        );
    }

    #[test]
    fn test_row_without_metadata_omits_field() {
        let row = CanonicalVerseRow::new(1, 1, 1, "In the beginning");
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("metaData").is_none());
        assert!(row.published_versification().is_empty());
        assert_eq!(row.reference_id().unwrap().value(), 1_001_001);
    }
}
