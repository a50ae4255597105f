//! Book catalog, verse storage and verse queries.
//!
//! The book catalog maps book codes to the numeric ids that lead every
//! reference id. An embedded catalog of the 66 protestant-canon books is
//! compiled into the binary; custom catalogs can be loaded from JSON files.
//!
//! Canonical verse rows live in a [`ResourceRegistry`]: one [`BibleTable`] per
//! bible resource, keyed by reference id so iteration is reading order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use versifier::catalog::{BookCatalog, BookLookup};
//!
//! let books = BookCatalog::load_embedded().unwrap();
//! let john = books.find_by_code("JHN").unwrap();
//! assert_eq!(john.book_id, 43);
//! ```
//!
//! [`ResourceRegistry`]: store::ResourceRegistry
//! [`BibleTable`]: store::BibleTable

use thiserror::Error;

use crate::core::reference::{CodecError, ReferenceId};
use crate::core::types::BookRef;
use crate::core::verse::CanonicalVerseRow;
use crate::utils::validation::ValidationError;

pub mod books;
pub mod query;
pub mod store;

pub use books::BookCatalog;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to persist store: {0}")]
    PersistError(#[from] tempfile::PersistError),

    #[error("Bible book code, {0}, not found in catalog")]
    BookNotFound(String),

    #[error("Bible book, {book}, not found in {resource}")]
    BookNotUploaded { book: String, resource: String },

    #[error("Bible book, {book}, already present in {resource}")]
    BookAlreadyPresent { book: String, resource: String },

    #[error("Resource {0}, not found in store")]
    ResourceNotFound(String),

    #[error("Resource {0}, already exists")]
    ResourceExists(String),

    #[error(transparent)]
    InvalidResource(#[from] ValidationError),

    #[error("Duplicate verse row at reference {0}")]
    DuplicateRow(ReferenceId),

    #[error(transparent)]
    Reference(#[from] CodecError),
}

/// Read access to canonical book reference data
pub trait BookLookup {
    /// Find a book by code; matching is case-insensitive
    fn find_by_code(&self, code: &str) -> Option<&BookRef>;

    fn find_by_id(&self, book_id: u32) -> Option<&BookRef>;

    /// Like [`BookLookup::find_by_code`], but a missing book is an error
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` if no book has this code.
    fn require_code(&self, code: &str) -> Result<&BookRef, CatalogError> {
        self.find_by_code(code)
            .ok_or_else(|| CatalogError::BookNotFound(code.to_string()))
    }
}

/// Storage of canonical verse rows for one bible
pub trait VerseStore {
    /// Delete all rows of a book, or of one chapter of it. Returns the number removed.
    fn delete_rows(&mut self, book_id: u32, chapter: Option<u32>) -> usize;

    /// Insert rows as a unit: either all are stored or none are.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateRow` if a row's position is already
    /// stored or repeated in `rows`, and `CatalogError::Reference` if a row
    /// cannot be encoded.
    fn insert_rows(&mut self, rows: Vec<CanonicalVerseRow>) -> Result<usize, CatalogError>;

    /// Rows in strictly increasing reference id order, optionally for one book
    fn query_ordered_by_reference(&self, book_id: Option<u32>) -> Vec<CanonicalVerseRow>;
}
