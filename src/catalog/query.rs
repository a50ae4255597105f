use serde::{Deserialize, Serialize};

use crate::catalog::store::{BibleTable, VerseRecord};
use crate::catalog::{BookLookup, CatalogError};
use crate::core::reference::{encode, ReferenceId, MAX_COMPONENT};
use crate::core::verse::VerseMetadata;
use crate::utils::text::normalize_text;

/// Default page size of verse and book listings
pub const DEFAULT_LIMIT: usize = 100;

fn default_active() -> bool {
    true
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Filters for a verse listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseQuery {
    pub book_code: Option<String>,
    pub chapter: Option<u32>,
    /// First verse; also the last one unless `last_verse` is set
    pub verse: Option<u32>,
    pub last_verse: Option<u32>,
    /// Substring of the verse text, matched after normalization
    pub search_phrase: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for VerseQuery {
    fn default() -> Self {
        Self {
            book_code: None,
            chapter: None,
            verse: None,
            last_verse: None,
            search_phrase: None,
            active: true,
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Position of a hit within a named bible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseLocation {
    pub bible: String,
    pub book: String,
    pub chapter: u32,
    pub verse_number: u32,
}

/// One verse returned by a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseHit {
    pub reference: VerseLocation,
    pub verse_text: String,
    #[serde(rename = "metaData", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VerseMetadata>,
}

/// Start and optional end of a passage, by book code.
///
/// A missing start verse means the start of the chapter. A missing end
/// chapter or book falls back to the start's; a missing end verse means
/// the end of the chapter, unless no end was given at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageQuery {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
    pub book_end: Option<String>,
    pub chapter_end: Option<u32>,
    pub verse_end: Option<u32>,
}

impl PassageQuery {
    /// A passage within one chapter
    pub fn chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse: None,
            book_end: None,
            chapter_end: None,
            verse_end: None,
        }
    }

    #[must_use]
    pub fn verses(mut self, first: u32, last: Option<u32>) -> Self {
        self.verse = Some(first);
        self.verse_end = last;
        self
    }

    #[must_use]
    pub fn until(mut self, book: impl Into<String>, chapter: u32, verse: Option<u32>) -> Self {
        self.book_end = Some(book.into());
        self.chapter_end = Some(chapter);
        self.verse_end = verse;
        self
    }

    fn has_end(&self) -> bool {
        self.book_end.is_some() || self.chapter_end.is_some() || self.verse_end.is_some()
    }
}

/// Closed interval of reference ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRange {
    pub start: ReferenceId,
    pub end: ReferenceId,
}

impl ReferenceRange {
    /// Resolve a passage to ids through the book lookup
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` for an unknown book code and
    /// `CatalogError::Reference` if a component is out of range.
    pub fn resolve<L: BookLookup>(lookup: &L, passage: &PassageQuery) -> Result<Self, CatalogError> {
        let start_book = lookup.require_code(&passage.book)?;
        let end_book = match &passage.book_end {
            Some(code) => lookup.require_code(code)?,
            None => start_book,
        };
        let end_chapter = passage.chapter_end.unwrap_or(passage.chapter);
        let end_verse = match (passage.verse_end, passage.verse) {
            (Some(verse), _) => verse,
            (None, Some(verse)) if !passage.has_end() => verse,
            _ => MAX_COMPONENT,
        };

        Ok(Self {
            start: encode(start_book.book_id, passage.chapter, passage.verse.unwrap_or(0))?,
            end: encode(end_book.book_id, end_chapter, end_verse)?,
        })
    }

    #[must_use]
    pub fn contains(&self, id: ReferenceId) -> bool {
        self.start <= id && id <= self.end
    }
}

/// Runs verse queries against one bible table
pub struct VerseFinder<'a, L: BookLookup> {
    table: &'a BibleTable,
    lookup: &'a L,
}

impl<'a, L: BookLookup> VerseFinder<'a, L> {
    pub fn new(table: &'a BibleTable, lookup: &'a L) -> Self {
        Self { table, lookup }
    }

    /// Verses matching the filters, in reference order
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` if `book_code` is not in the catalog.
    pub fn find_verses(&self, query: &VerseQuery) -> Result<Vec<VerseHit>, CatalogError> {
        let book_id = match &query.book_code {
            Some(code) => Some(self.lookup.require_code(code)?.book_id),
            None => None,
        };
        let verse_range = query
            .verse
            .map(|first| (first, query.last_verse.unwrap_or(first)));
        let phrase = query
            .search_phrase
            .as_deref()
            .map(normalize_text)
            .filter(|p| !p.is_empty());

        let hits = self
            .table
            .records(book_id)
            .filter(|r| r.active == query.active)
            .filter(|r| query.chapter.map_or(true, |c| r.row.chapter == c))
            .filter(|r| {
                verse_range.map_or(true, |(first, last)| {
                    (first..=last).contains(&r.row.verse_number)
                })
            })
            .filter(|r| {
                phrase
                    .as_deref()
                    .map_or(true, |p| r.row.verse_text.contains(p))
            })
            .skip(query.skip)
            .take(query.limit)
            .map(|r| self.hit(r))
            .collect();
        Ok(hits)
    }

    /// Active verses of a passage, which may cross chapter and book boundaries
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ReferenceRange::resolve`].
    pub fn find_passage(&self, passage: &PassageQuery) -> Result<Vec<VerseHit>, CatalogError> {
        let range = ReferenceRange::resolve(self.lookup, passage)?;
        Ok(self
            .table
            .records_between(range.start, range.end)
            .filter(|r| r.active)
            .map(|r| self.hit(r))
            .collect())
    }

    fn hit(&self, record: &VerseRecord) -> VerseHit {
        let row = &record.row;
        let book = self
            .lookup
            .find_by_id(row.book_id)
            .map_or_else(|| format!("{:03}", row.book_id), |b| b.book_code.clone());
        VerseHit {
            reference: VerseLocation {
                bible: self.table.resource().to_string(),
                book,
                chapter: row.chapter,
                verse_number: row.verse_number,
            },
            verse_text: row.verse_text.clone(),
            metadata: row.metadata.clone(),
        }
    }
}

/// A reference id decoded to a book code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedReference {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

/// Decode a raw reference id and look its book up by id
///
/// # Errors
///
/// Returns `CatalogError::Reference` for a malformed id and
/// `CatalogError::BookNotFound` if the book id is not in the catalog.
pub fn decode_reference<L: BookLookup>(lookup: &L, raw: u64) -> Result<DecodedReference, CatalogError> {
    let id = ReferenceId::from_raw(raw)?;
    let book = lookup
        .find_by_id(id.book())
        .ok_or_else(|| CatalogError::BookNotFound(format!("{:03}", id.book())))?;
    Ok(DecodedReference {
        book: book.book_code.clone(),
        chapter: id.chapter(),
        verse: id.verse(),
    })
}
