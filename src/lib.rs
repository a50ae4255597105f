//! # versifier
//!
//! A library for normalizing bible verse numbering and reporting the
//! versification of a bible.
//!
//! Published bibles do not agree on how verses are numbered. One translation
//! prints "12-14" as a single merged verse, another splits verse 12 into "12a"
//! and "12b", and some leave verses out altogether. `versifier` stores every
//! book in one canonical shape, a row per verse keyed by a reference id that
//! sorts in reading order, and keeps an audit trail of how each row was
//! published.
//!
//! ## Features
//!
//! - **USFM and JSON input**: Books are accepted in either form
//! - **Split/merge resolution**: `12a`+`12b` fold into verse 12, `12-14` expands to three rows
//! - **Reference ids**: `BBBCCCVVV` integers in reading order
//! - **Verse queries**: By chapter, verse range, phrase, or passage across books
//! - **Versification report**: Max verse per chapter, excluded, merged and split verses
//!
//! ## Example
//!
//! ```rust,no_run
//! use versifier::{compute_versification, BookCatalog, ResourceRegistry, VerseStore};
//! use versifier::canon::upload::{upload_books, BookSource};
//!
//! let books = BookCatalog::load_embedded().unwrap();
//! let mut registry = ResourceRegistry::new();
//! let table = registry.create("en_KJV_1_bible").unwrap();
//!
//! let source = BookSource::from_usfm("\\id GEN\n\\c 1\n\\v 1 In the beginning\n\\v 2-3 And\n");
//! upload_books(table, &books, &[source]).unwrap();
//!
//! let rows = table.query_ordered_by_reference(None);
//! let report = compute_versification(&rows, &books);
//! println!("{:?}", report.max_verses.get("gen"));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Book, reference id and canonical row types
//! - [`parsing`]: USFM, book JSON and verse-number token parsers
//! - [`canon`]: Classification and split/merge resolution
//! - [`catalog`]: Book catalog, verse storage and queries
//! - [`versification`]: Versification report
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: JSON web API

pub mod canon;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod parsing;
pub mod utils;
pub mod versification;
pub mod web;

// Re-export commonly used types for convenience
pub use canon::upload::classify_and_resolve;
pub use catalog::query::{VerseFinder, VerseQuery};
pub use catalog::store::{BibleTable, ResourceRegistry};
pub use catalog::{BookCatalog, BookLookup, VerseStore};
pub use core::reference::{decode, encode, ReferenceId, VerseRef};
pub use core::types::*;
pub use core::verse::CanonicalVerseRow;
pub use versification::{compute_versification, VersificationReport};
