//! Parsers for bible book sources and verse-number tokens.
//!
//! This module provides parsers for:
//!
//! - **Book JSON**: `{"book": {"bookCode"}, "chapters": [{"chapterNumber", "contents": [...]}]}`
//! - **USFM**: `\id`, `\c` and `\v` markers of a USFM book
//! - **Verse-number tokens**: normal (`12`), split (`12a`) and merged (`12-14`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use versifier::parsing::usfm::parse_usfm;
//!
//! let doc = parse_usfm("\\id GEN\n\\c 1\n\\v 1 In the beginning\n").unwrap();
//! assert_eq!(doc.chapters[0].contents[0].verse_number, "1");
//! ```

use thiserror::Error;

pub mod book_json;
pub mod usfm;
pub mod verse_number;

use crate::utils::validation::MAX_CONTENTS;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON is not of the required format: {0}")]
    InvalidFormat(String),

    #[error("JSON is not of the required format: '{field}' not found in {context}")]
    MissingField { field: &'static str, context: String },

    #[error("USFM is not of the required format (line {line}): {message}")]
    Usfm { line: usize, message: String },

    #[error("Too many verse entries: {0} exceeds maximum allowed ({MAX_CONTENTS})")]
    TooManyContents(usize),
}

impl ParseError {
    pub(crate) fn missing(field: &'static str, context: impl Into<String>) -> Self {
        Self::MissingField {
            field,
            context: context.into(),
        }
    }
}
