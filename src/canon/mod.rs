//! Verse normalization: from published verse numbering to canonical rows.
//!
//! Source texts number their verses in three shapes:
//!
//! | Token  | Shape  | Canonical rows                                   |
//! |--------|--------|--------------------------------------------------|
//! | `12`   | Normal | one row, verse 12                                |
//! | `12a`  | Split  | fragments folded into one row, verse 12          |
//! | `12-14`| Merged | verse 12 holds the text, 13 and 14 are empty     |
//!
//! Classification runs per content entry into an [`UploadAccumulator`];
//! split fragments wait in a side table until [`resolve_split_verses`] folds
//! them, once, after the whole book has been classified.
//!
//! ## Example
//!
//! ```rust,no_run
//! use versifier::canon::upload::classify_and_resolve;
//! use versifier::core::types::BookRef;
//! use versifier::parsing::book_json::{ChapterContent, VerseContent};
//!
//! let book = BookRef::new(1, "gen", "Genesis");
//! let chapters = vec![ChapterContent::new(1, vec![
//!     VerseContent::new("1", "In the beginning"),
//!     VerseContent::new("2a", "And the earth"),
//!     VerseContent::new("2b", "was without form"),
//! ])];
//! let rows = classify_and_resolve(&book, &chapters).unwrap();
//! assert_eq!(rows[1].verse_text, "And the earth was without form");
//! ```
//!
//! [`UploadAccumulator`]: classifier::UploadAccumulator
//! [`resolve_split_verses`]: resolver::resolve_split_verses

use thiserror::Error;

use crate::core::reference::CodecError;
use crate::parsing::verse_number::TokenError;

pub mod classifier;
pub mod resolver;
pub mod upload;

#[derive(Error, Debug)]
pub enum CanonError {
    #[error("Unrecognized pattern in {book} chapter {chapter} verse {token}: {reason}")]
    Format {
        book: String,
        chapter: u32,
        token: String,
        #[source]
        reason: TokenError,
    },

    #[error("Duplicate verse {book} {chapter}:{verse} after split/merge resolution")]
    DuplicateVerse {
        book: String,
        chapter: u32,
        verse: u32,
    },

    #[error("Reference out of range in {book} chapter {chapter}: {source}")]
    Range {
        book: String,
        chapter: u32,
        #[source]
        source: CodecError,
    },

    #[error("Row {row_index} has no unresolved split fragments")]
    Resolve { row_index: usize },
}
