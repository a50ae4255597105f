use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parsing::ParseError;
use crate::utils::validation::check_content_limit;

/// Book identification block of a book document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookHeader {
    pub book_code: String,
}

/// One `{verseNumber, verseText}` entry of a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseContent {
    /// Raw verse-number token (e.g. "3", "23a", "5-7")
    pub verse_number: String,
    pub verse_text: String,
}

impl VerseContent {
    pub fn new(verse_number: impl Into<String>, verse_text: impl Into<String>) -> Self {
        Self {
            verse_number: verse_number.into(),
            verse_text: verse_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    pub chapter_number: u32,
    pub contents: Vec<VerseContent>,
}

impl ChapterContent {
    pub fn new(chapter_number: u32, contents: Vec<VerseContent>) -> Self {
        Self {
            chapter_number,
            contents,
        }
    }
}

/// A bible book in its JSON source form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDocument {
    pub book: BookHeader,
    pub chapters: Vec<ChapterContent>,
}

impl BookDocument {
    pub fn new(book_code: impl Into<String>, chapters: Vec<ChapterContent>) -> Self {
        Self {
            book: BookHeader {
                book_code: book_code.into(),
            },
            chapters,
        }
    }

    #[must_use]
    pub fn book_code(&self) -> &str {
        &self.book.book_code
    }

    /// Total number of verse entries across all chapters
    #[must_use]
    pub fn content_count(&self) -> usize {
        self.chapters.iter().map(|c| c.contents.len()).sum()
    }

    /// Parse a book document from JSON text
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` for invalid JSON, or the structural errors of
    /// [`BookDocument::from_json`].
    pub fn from_json_str(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Build a book document from a JSON value, naming the offending field on failure.
    ///
    /// Content entries without a `verseNumber` (headings, section titles) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` when `book.bookCode`, `chapters`,
    /// `chapterNumber`, `contents` or `verseText` is absent,
    /// `ParseError::InvalidFormat` when a field has the wrong type, and
    /// `ParseError::TooManyContents` when the entry limit is exceeded.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let book_code = value
            .get("book")
            .and_then(|b| b.get("bookCode"))
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::missing("book.bookCode", "book document"))?;

        let chapters_value = value
            .get("chapters")
            .ok_or_else(|| ParseError::missing("chapters", "book document"))?;
        let chapters_value = chapters_value.as_array().ok_or_else(|| {
            ParseError::InvalidFormat("'chapters' should be an array".to_string())
        })?;

        let mut chapters = Vec::with_capacity(chapters_value.len());
        let mut total_contents = 0;

        for chapter in chapters_value {
            let number_value = chapter
                .get("chapterNumber")
                .ok_or_else(|| ParseError::missing("chapterNumber", "chapter"))?;
            let contents_value = chapter
                .get("contents")
                .ok_or_else(|| ParseError::missing("contents", "chapter"))?;

            let chapter_number = parse_chapter_number(number_value)?;
            let contents_value = contents_value.as_array().ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "'contents' of chapter {chapter_number} should be an array"
                ))
            })?;

            let mut contents = Vec::with_capacity(contents_value.len());
            for content in contents_value {
                let Some(verse_number) = content.get("verseNumber") else {
                    continue;
                };
                let verse_number = token_text(verse_number).ok_or_else(|| {
                    ParseError::InvalidFormat(format!(
                        "verseNumber in chapter {chapter_number} should be a string or number"
                    ))
                })?;
                let verse_text = content
                    .get("verseText")
                    .ok_or_else(|| {
                        ParseError::missing(
                            "verseText",
                            format!("chapter {chapter_number}, verse {verse_number}"),
                        )
                    })?
                    .as_str()
                    .ok_or_else(|| {
                        ParseError::InvalidFormat(format!(
                            "verseText of chapter {chapter_number}, verse {verse_number} should be a string"
                        ))
                    })?;

                if check_content_limit(total_contents).is_some() {
                    return Err(ParseError::TooManyContents(total_contents));
                }
                total_contents += 1;
                contents.push(VerseContent::new(verse_number, verse_text));
            }

            chapters.push(ChapterContent::new(chapter_number, contents));
        }

        Ok(Self::new(book_code, chapters))
    }

    /// JSON form of this document
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<Value, ParseError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Chapter numbers may arrive as integers or numeric strings
fn parse_chapter_number(value: &Value) -> Result<u32, ParseError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "chapterNumber should be a non-negative integer, got {value}"
        ))
    })
}

fn token_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
