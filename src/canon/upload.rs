//! Upload, update and delete of whole bible books.
//!
//! Each book is parsed, classified and resolved completely in memory before
//! anything is written to the table, so a failing book leaves no rows behind.
//! Books earlier in a batch stay applied; a [`BatchError`] lists them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::canon::classifier::UploadAccumulator;
use crate::canon::CanonError;
use crate::catalog::store::{BibleTable, BookContent};
use crate::catalog::{BookLookup, CatalogError, VerseStore};
use crate::core::types::{normalize_book_code, BookRef};
use crate::core::verse::CanonicalVerseRow;
use crate::parsing::book_json::{BookDocument, ChapterContent};
use crate::parsing::usfm::{parse_usfm, to_usfm};
use crate::parsing::ParseError;
use crate::utils::text::normalize_text;
use crate::utils::validation::check_batch_limit;

/// Classify every content entry of a book and fold its split verses.
///
/// The returned rows are unique per `(chapter, verse)` and every one of them
/// has a valid reference id.
///
/// # Errors
///
/// Returns `CanonError::Format` for a malformed verse-number token,
/// `CanonError::Range` if a chapter or verse does not fit a reference id, and
/// `CanonError::DuplicateVerse` if two entries claim the same verse.
pub fn classify_and_resolve(
    book: &BookRef,
    chapters: &[ChapterContent],
) -> Result<Vec<CanonicalVerseRow>, CanonError> {
    let mut acc = UploadAccumulator::new();
    for chapter in chapters {
        for content in &chapter.contents {
            acc.classify(book, chapter.chapter_number, content)?;
        }
    }
    let rows = acc.finish()?;

    let mut seen = HashSet::with_capacity(rows.len());
    for row in &rows {
        row.reference_id().map_err(|source| CanonError::Range {
            book: book.book_code.clone(),
            chapter: row.chapter,
            source,
        })?;
        if !seen.insert((row.chapter, row.verse_number)) {
            return Err(CanonError::DuplicateVerse {
                book: book.book_code.clone(),
                chapter: row.chapter,
                verse: row.verse_number,
            });
        }
    }
    Ok(rows)
}

/// A book as submitted for upload: USFM, JSON, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSource {
    #[serde(rename = "USFM", alias = "usfm", default, skip_serializing_if = "Option::is_none")]
    pub usfm: Option<String>,
    #[serde(rename = "JSON", alias = "json", default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
}

/// Both source forms of a book, plus the parsed document
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub document: BookDocument,
    pub usfm: String,
    pub json: Value,
}

impl BookSource {
    pub fn from_usfm(text: impl Into<String>) -> Self {
        Self {
            usfm: Some(text.into()),
            json: None,
        }
    }

    pub fn from_json(value: Value) -> Self {
        Self {
            usfm: None,
            json: Some(value),
        }
    }

    /// Read a book file. `.json` files are JSON documents; anything else is
    /// read as USFM unless its first character opens a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read and
    /// `ParseError::Json` for a malformed JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
            || content.trim_start().starts_with('{');

        if is_json {
            Ok(Self::from_json(serde_json::from_str(&content)?))
        } else {
            Ok(Self::from_usfm(content))
        }
    }

    /// Derive the missing form from the given one. When both are given, USFM
    /// wins and JSON is regenerated from it.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if neither form is present, or the
    /// parse errors of the given form.
    pub fn resolve(&self) -> Result<ResolvedSource, ParseError> {
        let (document, usfm) = match (&self.usfm, &self.json) {
            (Some(usfm), _) => (parse_usfm(usfm)?, usfm.clone()),
            (None, Some(json)) => {
                let document = BookDocument::from_json(json)?;
                let usfm = to_usfm(&document);
                (document, usfm)
            }
            (None, None) => {
                return Err(ParseError::InvalidFormat(
                    "either USFM or JSON is required".to_string(),
                ))
            }
        };
        let json = document.to_json()?;
        Ok(ResolvedSource {
            document,
            usfm: normalize_text(&usfm),
            json,
        })
    }
}

/// A change to an uploaded book: new content, a new active flag, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub book_code: String,
    #[serde(flatten)]
    pub source: BookSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl BookUpdate {
    fn has_content(&self) -> bool {
        self.source.usfm.is_some() || self.source.json.is_some()
    }
}

/// Coarse error category, used for exit reporting and HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    NotFound,
    Range,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Canon(#[from] CanonError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    BatchTooLarge(String),

    #[error("Book code mismatch: update for {expected} carries content for {found}")]
    CodeMismatch { expected: String, found: String },
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(ParseError::Io(_)) => ErrorKind::Internal,
            Self::Parse(_) | Self::BatchTooLarge(_) | Self::CodeMismatch { .. } => {
                ErrorKind::Format
            }
            Self::Canon(CanonError::Range { .. }) => ErrorKind::Range,
            Self::Canon(_) => ErrorKind::Format,
            Self::Catalog(err) => catalog_error_kind(err),
        }
    }
}

/// Category of a catalog error
pub fn catalog_error_kind(err: &CatalogError) -> ErrorKind {
    match err {
        CatalogError::BookNotFound(_)
        | CatalogError::BookNotUploaded { .. }
        | CatalogError::ResourceNotFound(_) => ErrorKind::NotFound,
        CatalogError::BookAlreadyPresent { .. }
        | CatalogError::ResourceExists(_)
        | CatalogError::DuplicateRow(_) => ErrorKind::Conflict,
        CatalogError::InvalidResource(_) => ErrorKind::Format,
        CatalogError::Reference(_) => ErrorKind::Range,
        CatalogError::ReadError(_) | CatalogError::ParseError(_) | CatalogError::PersistError(_) => {
            ErrorKind::Internal
        }
    }
}

/// Failure of one book in a batch, with the books applied before it
#[derive(Error, Debug)]
#[error("{source}")]
pub struct BatchError {
    /// Codes of books written before the failure
    pub applied: Vec<String>,
    /// Position of the failing item in the batch
    pub index: usize,
    #[source]
    pub source: UploadError,
}

impl BatchError {
    fn new(applied: Vec<String>, index: usize, source: impl Into<UploadError>) -> Self {
        Self {
            applied,
            index,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// What a batch wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub resource: String,
    /// Book codes in the order they were applied
    pub books: Vec<String>,
    /// Canonical rows written
    pub rows_written: usize,
    /// Rows whose active flag was changed
    pub rows_flagged: usize,
}

/// Upload new books into a bible table.
///
/// # Errors
///
/// Stops at the first failing book and returns a [`BatchError`] listing the
/// books already applied. A book already present in the table is
/// `CatalogError::BookAlreadyPresent`.
pub fn upload_books<L: BookLookup>(
    table: &mut BibleTable,
    lookup: &L,
    sources: &[BookSource],
) -> Result<UploadSummary, BatchError> {
    if let Some(message) = check_batch_limit(sources.len()) {
        return Err(BatchError::new(Vec::new(), 0, UploadError::BatchTooLarge(message)));
    }

    let mut summary = UploadSummary {
        resource: table.resource().to_string(),
        ..UploadSummary::default()
    };
    for (index, source) in sources.iter().enumerate() {
        let written = upload_one(table, lookup, source)
            .map_err(|e| BatchError::new(summary.books.clone(), index, e))?;
        summary.books.push(written.0);
        summary.rows_written += written.1;
    }

    info!(
        "{}: uploaded {} book(s), {} verse rows",
        summary.resource,
        summary.books.len(),
        summary.rows_written
    );
    Ok(summary)
}

fn upload_one<L: BookLookup>(
    table: &mut BibleTable,
    lookup: &L,
    source: &BookSource,
) -> Result<(String, usize), UploadError> {
    let resolved = source.resolve()?;
    let book = lookup.require_code(resolved.document.book_code())?;
    if table.has_book(book.book_id) {
        return Err(CatalogError::BookAlreadyPresent {
            book: book.book_code.clone(),
            resource: table.resource().to_string(),
        }
        .into());
    }

    let rows = classify_and_resolve(book, &resolved.document.chapters)?;
    let written = table.insert_rows(rows)?;
    table.put_book(BookContent {
        book_id: book.book_id,
        book_code: book.book_code.clone(),
        usfm: Some(resolved.usfm),
        json: Some(resolved.json),
        active: true,
    });
    Ok((book.book_code.clone(), written))
}

/// Update books already in a bible table.
///
/// New content replaces the book: its rows are deleted and regenerated. An
/// `active` flag is applied to the book and every one of its rows.
///
/// # Errors
///
/// Stops at the first failing book and returns a [`BatchError`] listing the
/// books already applied. A book not in the table is
/// `CatalogError::BookNotUploaded`.
pub fn update_books<L: BookLookup>(
    table: &mut BibleTable,
    lookup: &L,
    updates: &[BookUpdate],
) -> Result<UploadSummary, BatchError> {
    if let Some(message) = check_batch_limit(updates.len()) {
        return Err(BatchError::new(Vec::new(), 0, UploadError::BatchTooLarge(message)));
    }

    let mut summary = UploadSummary {
        resource: table.resource().to_string(),
        ..UploadSummary::default()
    };
    for (index, update) in updates.iter().enumerate() {
        let (written, flagged) = update_one(table, lookup, update)
            .map_err(|e| BatchError::new(summary.books.clone(), index, e))?;
        summary.books.push(normalize_book_code(&update.book_code));
        summary.rows_written += written;
        summary.rows_flagged += flagged;
    }

    info!(
        "{}: updated {} book(s), {} rows rewritten, {} rows flagged",
        summary.resource,
        summary.books.len(),
        summary.rows_written,
        summary.rows_flagged
    );
    Ok(summary)
}

fn update_one<L: BookLookup>(
    table: &mut BibleTable,
    lookup: &L,
    update: &BookUpdate,
) -> Result<(usize, usize), UploadError> {
    let book = lookup.require_code(&update.book_code)?;
    let Some(existing) = table.book(book.book_id).cloned() else {
        return Err(CatalogError::BookNotUploaded {
            book: book.book_code.clone(),
            resource: table.resource().to_string(),
        }
        .into());
    };

    let mut written = 0;
    if update.has_content() {
        let resolved = update.source.resolve()?;
        if lookup.find_by_code(resolved.document.book_code()) != Some(book) {
            return Err(UploadError::CodeMismatch {
                expected: book.book_code.clone(),
                found: resolved.document.book_code().to_string(),
            });
        }
        let rows = classify_and_resolve(book, &resolved.document.chapters)?;

        table.delete_rows(book.book_id, None);
        written = table.insert_rows(rows)?;
        if !existing.active {
            table.set_book_active(book.book_id, false);
        }
        table.put_book(BookContent {
            usfm: Some(resolved.usfm),
            json: Some(resolved.json),
            ..existing
        });
    }

    let flagged = match update.active {
        Some(active) => table.set_book_active(book.book_id, active),
        None => 0,
    };
    Ok((written, flagged))
}

/// Remove a book document and all of its canonical rows
///
/// # Errors
///
/// Returns `CatalogError::BookNotFound` for an unknown code and
/// `CatalogError::BookNotUploaded` if the table does not hold the book.
pub fn delete_book<L: BookLookup>(
    table: &mut BibleTable,
    lookup: &L,
    book_code: &str,
) -> Result<BookContent, CatalogError> {
    let book = lookup.require_code(book_code)?;
    table
        .remove_book(book.book_id)
        .ok_or_else(|| CatalogError::BookNotUploaded {
            book: book.book_code.clone(),
            resource: table.resource().to_string(),
        })
}
